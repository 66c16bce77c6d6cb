//! # Publish Module
//!
//! Pushes an [`ArtifactBundle`](crate::generator::ArtifactBundle) to a remote
//! repository through the [`RemoteRepository`] trait.
//!
//! ```text
//! test_connection ─▶ create_repository_if_absent ─▶ list_files ─▶ reconcile ─▶ push_files × N
//! ```
//!
//! Only files that differ from the remote branch are pushed. Changes are
//! chunked into batches of [`PublishOptions::batch_size`] to respect remote
//! payload limits, and progress is reported after every batch. Nothing is
//! retried or rolled back: a failed batch surfaces as
//! [`PublishError::Partial`](crate::error::PublishError::Partial) with the
//! number of batches and files already pushed, counted per operation kind.
//!
//! The local directory sink is [`write_bundle`](crate::generator::write_bundle).

mod repository;
mod workflow;
#[cfg(test)]
mod tests;

pub use repository::{FileChange, RemoteRepository};
pub use workflow::{publish_bundle, PublishOptions, PublishProgress, PublishReport};
