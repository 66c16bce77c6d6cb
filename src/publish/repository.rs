use crate::error::RemoteError;
use crate::generator::GeneratedFile;

/// One change sent to the remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// Create or replace a file
    Put(GeneratedFile),
    /// Remove a file the bundle no longer produces
    Delete(String),
}

impl FileChange {
    pub fn path(&self) -> &str {
        match self {
            FileChange::Put(file) => &file.path,
            FileChange::Delete(path) => path,
        }
    }
}

/// Remote repository hosting published bundles.
///
/// Implementations map every non-2xx response to a [`RemoteError`] (see
/// [`RemoteError::from_status`]) and never retry on their own.
pub trait RemoteRepository {
    /// Cheap authenticated call; `false` when the remote cannot be used.
    fn test_connection(&self) -> bool;

    /// Create the repository unless it exists. Returns `true` when it was created.
    fn create_repository_if_absent(&mut self, name: &str) -> Result<bool, RemoteError>;

    /// Every file currently on `branch`.
    fn list_files(&self, branch: &str) -> Result<Vec<GeneratedFile>, RemoteError>;

    /// Apply one batch of changes to `branch` as a single commit.
    fn push_files(
        &mut self,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<(), RemoteError>;
}
