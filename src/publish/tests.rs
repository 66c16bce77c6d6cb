#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::PublishSettings;
use crate::error::{PublishError, RemoteError, RemoteErrorKind};
use crate::generator::{ArtifactBundle, GeneratedFile};
use http::StatusCode;
use std::collections::BTreeMap;

/// In-memory repository with switchable failures
#[derive(Default)]
struct MemoryRepository {
    offline: bool,
    exists: bool,
    files: BTreeMap<String, String>,
    pushes: Vec<(String, Vec<String>)>,
    fail_on_push: Option<usize>,
}

impl RemoteRepository for MemoryRepository {
    fn test_connection(&self) -> bool {
        !self.offline
    }

    fn create_repository_if_absent(&mut self, _name: &str) -> Result<bool, RemoteError> {
        if self.exists {
            return Ok(false);
        }
        self.exists = true;
        Ok(true)
    }

    fn list_files(&self, _branch: &str) -> Result<Vec<GeneratedFile>, RemoteError> {
        Ok(self
            .files
            .iter()
            .map(|(path, content)| GeneratedFile {
                path: path.clone(),
                content: content.clone(),
            })
            .collect())
    }

    fn push_files(
        &mut self,
        _branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<(), RemoteError> {
        if self.fail_on_push == Some(self.pushes.len()) {
            return Err(RemoteError::from_status(
                StatusCode::TOO_MANY_REQUESTS,
                "push rejected",
            ));
        }
        for change in files {
            match change {
                FileChange::Put(file) => {
                    self.files.insert(file.path.clone(), file.content.clone());
                }
                FileChange::Delete(path) => {
                    self.files.remove(path);
                }
            }
        }
        self.pushes.push((
            message.to_string(),
            files.iter().map(|c| c.path().to_string()).collect(),
        ));
        Ok(())
    }
}

fn bundle(n: usize) -> ArtifactBundle {
    let mut b = ArtifactBundle::new("proxy");
    for i in 0..n {
        b.insert(format!("file{i:02}.txt"), format!("content {i}"))
            .unwrap();
    }
    b
}

fn options(batch_size: usize) -> PublishOptions {
    let settings = PublishSettings {
        batch_size,
        ..PublishSettings::default()
    };
    PublishOptions::new("proxies", &settings)
}

#[test]
fn test_first_publication_creates_repository_and_batches() {
    let mut repo = MemoryRepository::default();
    let mut progress = Vec::new();
    let report = publish_bundle(&mut repo, &bundle(5), &options(2), |p| {
        progress.push((p.batch_index, p.total_batches, p.files_pushed))
    })
    .unwrap();

    assert!(report.created_repository);
    assert_eq!(report.counts.added, 5);
    assert_eq!(report.batches, 3);
    assert_eq!(report.files_pushed, 5);
    assert_eq!(progress, vec![(1, 3, 2), (2, 3, 4), (3, 3, 5)]);
    assert_eq!(repo.pushes[0].0, "Update generated proxy bundle (1/3)");
    assert_eq!(repo.files.len(), 5);
}

#[test]
fn test_republishing_identical_bundle_pushes_nothing() {
    let mut repo = MemoryRepository::default();
    publish_bundle(&mut repo, &bundle(3), &options(100), |_| {}).unwrap();
    let report = publish_bundle(&mut repo, &bundle(3), &options(100), |_| {}).unwrap();
    assert!(!report.created_repository);
    assert!(report.is_noop());
    assert_eq!(report.batches, 0);
    assert_eq!(repo.pushes.len(), 1);
}

#[test]
fn test_only_changed_files_are_pushed() {
    let mut repo = MemoryRepository {
        exists: true,
        ..MemoryRepository::default()
    };
    repo.files.insert("file00.txt".into(), "content 0".into());
    repo.files.insert("file01.txt".into(), "stale".into());
    repo.files.insert("obsolete.txt".into(), "old".into());

    let report = publish_bundle(&mut repo, &bundle(3), &options(100), |_| {}).unwrap();
    assert_eq!(report.counts.added, 1);
    assert_eq!(report.counts.updated, 1);
    assert_eq!(report.counts.deleted, 1);
    assert_eq!(
        repo.pushes[0].1,
        vec!["file01.txt", "file02.txt", "obsolete.txt"]
    );
    assert_eq!(repo.pushes[0].0, "Update generated proxy bundle");
    assert!(!repo.files.contains_key("obsolete.txt"));
}

#[test]
fn test_prune_disabled_keeps_remote_extras() {
    let mut repo = MemoryRepository {
        exists: true,
        ..MemoryRepository::default()
    };
    repo.files.insert("notes.md".into(), "keep me".into());
    let mut opts = options(100);
    opts.prune = false;
    let report = publish_bundle(&mut repo, &bundle(1), &opts, |_| {}).unwrap();
    assert_eq!(report.counts.deleted, 0);
    assert!(repo.files.contains_key("notes.md"));
}

#[test]
fn test_connection_failure_stops_before_any_call() {
    let mut repo = MemoryRepository {
        offline: true,
        ..MemoryRepository::default()
    };
    let err = publish_bundle(&mut repo, &bundle(1), &options(1), |_| {}).unwrap_err();
    assert_eq!(err, PublishError::ConnectionFailed);
    assert!(!repo.exists);
}

#[test]
fn test_partial_failure_reports_progress_so_far() {
    let mut repo = MemoryRepository {
        fail_on_push: Some(2),
        ..MemoryRepository::default()
    };
    let err = publish_bundle(&mut repo, &bundle(7), &options(3), |_| {}).unwrap_err();
    match err {
        PublishError::Partial {
            batches_completed,
            total_batches,
            files_pushed,
            completed,
            source,
        } => {
            assert_eq!(batches_completed, 2);
            assert_eq!(total_batches, 3);
            assert_eq!(files_pushed, 6);
            assert_eq!(completed.added, 6);
            assert_eq!(completed.total(), files_pushed);
            assert_eq!(source.kind, RemoteErrorKind::RateLimited);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // completed batches are not rolled back
    assert_eq!(repo.files.len(), 6);
}

#[test]
fn test_partial_failure_counts_completed_kinds() {
    let mut repo = MemoryRepository {
        exists: true,
        fail_on_push: Some(1),
        ..MemoryRepository::default()
    };
    repo.files.insert("file00.txt".into(), "old".into());
    repo.files.insert("stale.txt".into(), "gone".into());

    // plan: update file00, add file01, delete stale; the delete batch fails
    let err = publish_bundle(&mut repo, &bundle(2), &options(2), |_| {}).unwrap_err();
    let PublishError::Partial { completed, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(completed.added, 1);
    assert_eq!(completed.updated, 1);
    assert_eq!(completed.deleted, 0);
    assert!(err.to_string().contains("1 added, 1 updated, 0 deleted"));
    assert!(repo.files.contains_key("stale.txt"));
}

#[test]
fn test_zero_batch_size_is_clamped() {
    let mut repo = MemoryRepository::default();
    let report = publish_bundle(&mut repo, &bundle(2), &options(0), |_| {}).unwrap();
    assert_eq!(report.batches, 2);
}
