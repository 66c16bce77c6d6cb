use tracing::{debug, info, warn};

use super::repository::{FileChange, RemoteRepository};
use crate::config::PublishSettings;
use crate::error::{OperationCounts, PublishError};
use crate::generator::ArtifactBundle;
use crate::reconcile::{reconcile, OperationKind};

/// Where and how a bundle is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Remote repository, created on first publication
    pub repository: String,
    /// Branch listed and pushed to
    pub branch: String,
    /// Suffixed with `(i/n)` when the push spans several batches
    pub commit_message: String,
    /// Files per push; `0` is treated as `1`
    pub batch_size: usize,
    /// Delete remote files the bundle no longer contains
    pub prune: bool,
}

impl PublishOptions {
    /// Options for `repository` from the `[publish]` settings, pruning enabled.
    pub fn new(repository: impl Into<String>, settings: &PublishSettings) -> Self {
        PublishOptions {
            repository: repository.into(),
            branch: settings.branch.clone(),
            commit_message: settings.commit_message.clone(),
            batch_size: settings.batch_size,
            prune: true,
        }
    }
}

/// Reported after every pushed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishProgress {
    /// 1-based
    pub batch_index: usize,
    /// Fixed for the whole run
    pub total_batches: usize,
    /// Cumulative, including this batch
    pub files_pushed: usize,
    /// Changed files planned for the run
    pub total_files: usize,
}

/// Outcome of a completed publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub repository: String,
    pub branch: String,
    /// The repository did not exist before this run
    pub created_repository: bool,
    /// Files added, updated and deleted on the remote
    pub counts: OperationCounts,
    /// Push requests made; `0` when nothing changed
    pub batches: usize,
    /// Equals `counts.total()` on success
    pub files_pushed: usize,
    /// Fingerprint of the published bundle
    pub fingerprint: String,
}

impl PublishReport {
    /// The remote already matched the bundle.
    pub fn is_noop(&self) -> bool {
        self.files_pushed == 0
    }
}

/// Publish `bundle` to `repo`.
///
/// Tests the connection, creates the repository if needed, diffs the bundle
/// against the remote branch and pushes only changed files in batches of
/// `options.batch_size`. A failed batch stops the run; earlier batches stay
/// pushed and the error reports how far it got.
pub fn publish_bundle<R, F>(
    repo: &mut R,
    bundle: &ArtifactBundle,
    options: &PublishOptions,
    mut on_progress: F,
) -> Result<PublishReport, PublishError>
where
    R: RemoteRepository + ?Sized,
    F: FnMut(PublishProgress),
{
    if !repo.test_connection() {
        warn!(repository = %options.repository, "remote connection test failed");
        return Err(PublishError::ConnectionFailed);
    }

    let created = repo
        .create_repository_if_absent(&options.repository)
        .map_err(PublishError::Setup)?;
    let remote = if created {
        Vec::new()
    } else {
        repo.list_files(&options.branch)
            .map_err(PublishError::Setup)?
    };

    let plan = reconcile(&remote, bundle.files());
    let mut counts = OperationCounts::default();
    let mut changes = Vec::with_capacity(plan.len());
    let mut kinds = Vec::with_capacity(plan.len());
    for op in &plan.operations {
        match op.kind {
            OperationKind::Added | OperationKind::Updated => {
                changes.push(FileChange::Put(op.entry.clone()));
            }
            OperationKind::Deleted if options.prune => {
                changes.push(FileChange::Delete(op.name.to_string()));
            }
            OperationKind::Deleted => continue,
        }
        kinds.push(op.kind);
        counts.record(op.kind);
    }

    let batch_size = options.batch_size.max(1);
    let total_files = changes.len();
    let total_batches = total_files.div_ceil(batch_size);
    debug!(
        repository = %options.repository,
        changes = %counts,
        total_batches,
        batch_size,
        "publication planned"
    );

    let mut files_pushed = 0;
    let mut completed = OperationCounts::default();
    for (i, (batch, batch_kinds)) in changes
        .chunks(batch_size)
        .zip(kinds.chunks(batch_size))
        .enumerate()
    {
        let message = if total_batches > 1 {
            format!("{} ({}/{})", options.commit_message, i + 1, total_batches)
        } else {
            options.commit_message.clone()
        };
        if let Err(source) = repo.push_files(&options.branch, &message, batch) {
            warn!(
                repository = %options.repository,
                batch = i + 1,
                total_batches,
                files_pushed,
                completed = %completed,
                error = %source,
                "publication stopped"
            );
            return Err(PublishError::Partial {
                batches_completed: i,
                total_batches,
                files_pushed,
                completed,
                source,
            });
        }
        files_pushed += batch.len();
        for kind in batch_kinds {
            completed.record(*kind);
        }
        on_progress(PublishProgress {
            batch_index: i + 1,
            total_batches,
            files_pushed,
            total_files,
        });
    }

    info!(
        repository = %options.repository,
        branch = %options.branch,
        created,
        changes = %counts,
        batches = total_batches,
        "bundle published"
    );
    Ok(PublishReport {
        repository: options.repository.clone(),
        branch: options.branch.clone(),
        created_repository: created,
        counts,
        batches: total_batches,
        files_pushed,
        fingerprint: bundle.fingerprint(),
    })
}
