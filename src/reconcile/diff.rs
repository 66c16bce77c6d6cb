use std::collections::HashMap;
use std::fmt;

use crate::config::SecretMapEntry;

/// Anything with a unique name and a comparable value.
pub trait NamedEntry {
    fn entry_name(&self) -> &str;
    fn entry_value(&self) -> &str;
}

impl NamedEntry for SecretMapEntry {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn entry_value(&self) -> &str {
        &self.value
    }
}

impl NamedEntry for (String, String) {
    fn entry_name(&self) -> &str {
        &self.0
    }

    fn entry_value(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Added => "create",
            OperationKind::Updated => "update",
            OperationKind::Deleted => "delete",
        };
        f.write_str(s)
    }
}

/// One classified change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOperation<'a, E> {
    pub kind: OperationKind,
    pub name: &'a str,
    /// The entry from the new collection for adds/updates, from the original for deletes
    pub entry: &'a E,
}

/// Ordered create/update/delete operations turning `original` into `new`.
///
/// Adds and updates appear in new-collection order, deletions after them in
/// original-collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan<'a, E> {
    pub operations: Vec<EntryOperation<'a, E>>,
}

impl<'a, E> ReconcilePlan<'a, E> {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn of_kind(&self, kind: OperationKind) -> impl Iterator<Item = &EntryOperation<'a, E>> {
        self.operations.iter().filter(move |op| op.kind == kind)
    }

    pub fn names(&self, kind: OperationKind) -> Vec<&'a str> {
        self.of_kind(kind).map(|op| op.name).collect()
    }

    pub fn added(&self) -> Vec<&'a str> {
        self.names(OperationKind::Added)
    }

    pub fn updated(&self) -> Vec<&'a str> {
        self.names(OperationKind::Updated)
    }

    pub fn deleted(&self) -> Vec<&'a str> {
        self.names(OperationKind::Deleted)
    }
}

/// Three-way classification of `new` against `original`.
///
/// Names are assumed unique within each collection; check `new` with
/// [`validate_entries`](super::validate_entries) first.
pub fn reconcile<'a, E: NamedEntry>(original: &'a [E], new: &'a [E]) -> ReconcilePlan<'a, E> {
    let original_values: HashMap<&str, &str> = original
        .iter()
        .map(|e| (e.entry_name(), e.entry_value()))
        .collect();
    let new_names: HashMap<&str, ()> = new.iter().map(|e| (e.entry_name(), ())).collect();

    let mut operations = Vec::new();
    for entry in new {
        let name = entry.entry_name();
        match original_values.get(name) {
            None => operations.push(EntryOperation {
                kind: OperationKind::Added,
                name,
                entry,
            }),
            Some(old) if *old != entry.entry_value() => operations.push(EntryOperation {
                kind: OperationKind::Updated,
                name,
                entry,
            }),
            Some(_) => {}
        }
    }
    for entry in original {
        let name = entry.entry_name();
        if !new_names.contains_key(name) {
            operations.push(EntryOperation {
                kind: OperationKind::Deleted,
                name,
                entry,
            });
        }
    }
    ReconcilePlan { operations }
}
