//! # Reconcile Module
//!
//! Three-way diff between two named key/value collections, plus the
//! validation gate and the sequential remote sync built on it.
//!
//! The same [`reconcile`] function serves three callers:
//!
//! 1. comparing an edited secret map with its last saved state
//! 2. pushing a local secret map to a remote [`SecretStore`] ([`sync_entries`])
//! 3. planning which bundle files a publication must push
//!    ([`publish_bundle`](crate::publish::publish_bundle))
//!
//! ## Ordering
//!
//! Creates and updates are emitted in the order of the new collection,
//! deletions afterwards in the order of the original. A rename therefore
//! creates the new name before the old one disappears.

mod diff;
mod sync;
mod validate;

pub use diff::{reconcile, EntryOperation, NamedEntry, OperationKind, ReconcilePlan};
pub use sync::{sync_entries, sync_with_remote, SecretStore, SyncProgress, SyncReport};
pub use validate::{validate_entries, EntryLimits};
