use tracing::{debug, info, warn};

use super::diff::{reconcile, OperationKind};
use super::validate::{validate_entries, EntryLimits};
use crate::config::SecretMapEntry;
use crate::error::{OperationCounts, RemoteError, SyncError};

/// Remote key-value store holding one container of entries per secret map.
///
/// There is no batch primitive; every change is a separate call.
pub trait SecretStore {
    fn list_entries(&self, container: &str) -> Result<Vec<SecretMapEntry>, RemoteError>;
    fn create_entry(&mut self, container: &str, entry: &SecretMapEntry) -> Result<(), RemoteError>;
    fn update_entry(&mut self, container: &str, entry: &SecretMapEntry) -> Result<(), RemoteError>;
    fn delete_entry(&mut self, container: &str, name: &str) -> Result<(), RemoteError>;
}

/// Snapshot passed to the progress callback after each applied operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress<'a> {
    pub kind: OperationKind,
    pub entry: &'a str,
    pub counts: OperationCounts,
    pub total: usize,
}

/// Outcome of a completed synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub container: String,
    pub counts: OperationCounts,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.counts.total() == 0
    }
}

/// Apply the difference between `original` and `new` to `container`.
///
/// `new` is validated first; nothing is sent when it is rejected. Operations
/// run one at a time in plan order. On failure the error carries the exact
/// per-kind counts completed so far; applied operations are not rolled back.
pub fn sync_entries<S, F>(
    store: &mut S,
    container: &str,
    original: &[SecretMapEntry],
    new: &[SecretMapEntry],
    limits: &EntryLimits,
    mut on_progress: F,
) -> Result<SyncReport, SyncError>
where
    S: SecretStore + ?Sized,
    F: FnMut(SyncProgress<'_>),
{
    validate_entries(new, limits)?;

    let plan = reconcile(original, new);
    let total = plan.len();
    debug!(
        container,
        added = plan.added().len(),
        updated = plan.updated().len(),
        deleted = plan.deleted().len(),
        "sync plan computed"
    );

    let mut counts = OperationCounts::default();
    for op in &plan.operations {
        let result = match op.kind {
            OperationKind::Added => store.create_entry(container, op.entry),
            OperationKind::Updated => store.update_entry(container, op.entry),
            OperationKind::Deleted => store.delete_entry(container, op.name),
        };
        if let Err(source) = result {
            warn!(
                container,
                entry = op.name,
                kind = %op.kind,
                completed = %counts,
                error = %source,
                "sync stopped on remote failure"
            );
            return Err(SyncError::Partial {
                container: container.to_string(),
                completed: counts,
                kind: op.kind,
                entry: op.name.to_string(),
                source,
            });
        }
        counts.record(op.kind);
        on_progress(SyncProgress {
            kind: op.kind,
            entry: op.name,
            counts,
            total,
        });
    }

    info!(container, result = %counts, "secret map synchronized");
    Ok(SyncReport {
        container: container.to_string(),
        counts,
    })
}

/// Like [`sync_entries`], with the current remote contents as `original`.
pub fn sync_with_remote<S, F>(
    store: &mut S,
    container: &str,
    local: &[SecretMapEntry],
    limits: &EntryLimits,
    on_progress: F,
) -> Result<SyncReport, SyncError>
where
    S: SecretStore + ?Sized,
    F: FnMut(SyncProgress<'_>),
{
    validate_entries(local, limits)?;
    let remote = store
        .list_entries(container)
        .map_err(|source| SyncError::Listing {
            container: container.to_string(),
            source,
        })?;
    sync_entries(store, container, &remote, local, limits, on_progress)
}
