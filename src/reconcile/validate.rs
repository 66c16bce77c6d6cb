use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::diff::NamedEntry;
use crate::error::{ValidationError, ValidationIssue, ValidationKind};

/// Entry names: letters, digits, dot, underscore, hyphen.
static ENTRY_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("entry name regex should be valid"));

/// Size limits enforced before any side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct EntryLimits {
    pub max_name_length: usize,
    pub max_value_bytes: usize,
    pub max_entries: usize,
}

impl Default for EntryLimits {
    fn default() -> Self {
        EntryLimits {
            max_name_length: 255,
            max_value_bytes: 10 * 1024,
            max_entries: 500,
        }
    }
}

/// Reject a collection that breaks any rule, reporting every offence at once.
pub fn validate_entries<E: NamedEntry>(
    entries: &[E],
    limits: &EntryLimits,
) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    if entries.len() > limits.max_entries {
        issues.push(ValidationIssue::new(
            ValidationKind::TooManyEntries,
            "",
            format!(
                "{} entries exceed the limit of {}",
                entries.len(),
                limits.max_entries
            ),
        ));
    }

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for entry in entries {
        let name = entry.entry_name();
        let count = occurrences.entry(name).or_insert(0);
        if *count == 0 {
            first_seen.push(name);
        }
        *count += 1;
    }

    let mut duplicate_count = 0;
    for name in &first_seen {
        let count = occurrences.get(name).copied().unwrap_or(0);
        if count > 1 {
            duplicate_count += count;
            issues.push(ValidationIssue::new(
                ValidationKind::DuplicateName,
                *name,
                format!("name used by {count} entries"),
            ));
        }
    }

    for name in &first_seen {
        if name.is_empty() {
            issues.push(ValidationIssue::new(
                ValidationKind::InvalidName,
                *name,
                "name is empty",
            ));
        } else if name.len() > limits.max_name_length {
            issues.push(ValidationIssue::new(
                ValidationKind::InvalidName,
                *name,
                format!("name longer than {} characters", limits.max_name_length),
            ));
        } else if !ENTRY_NAME_REGEX.is_match(name) {
            issues.push(ValidationIssue::new(
                ValidationKind::InvalidName,
                *name,
                "only letters, digits, '.', '_' and '-' are allowed",
            ));
        }
    }

    for entry in entries {
        let size = entry.entry_value().len();
        if size > limits.max_value_bytes {
            issues.push(ValidationIssue::new(
                ValidationKind::OversizedValue,
                entry.entry_name(),
                format!(
                    "value is {size} bytes, limit is {}",
                    limits.max_value_bytes
                ),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            issues,
            duplicate_count,
        })
    }
}
