use anyhow::{bail, Context};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::GenerateError;
use crate::reconcile::NamedEntry;

/// One generated file, addressed by its `/`-separated path relative to the bundle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl NamedEntry for GeneratedFile {
    fn entry_name(&self) -> &str {
        &self.path
    }

    fn entry_value(&self) -> &str {
        &self.content
    }
}

/// The ordered path→content map produced by [`generate`](super::generate).
///
/// Insertion order is preserved and paths are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactBundle {
    pub root_directory_name: String,
    files: Vec<GeneratedFile>,
}

impl ArtifactBundle {
    pub fn new(root_directory_name: impl Into<String>) -> Self {
        ArtifactBundle {
            root_directory_name: root_directory_name.into(),
            files: Vec::new(),
        }
    }

    /// Append a file. A path that is already present is an error.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), GenerateError> {
        let path = path.into();
        if self.get(&path).is_some() {
            return Err(GenerateError::PathCollision(path));
        }
        self.files.push(GeneratedFile {
            path,
            content: content.into(),
        });
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// SHA-256 over every path and content, in insertion order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.root_directory_name.as_bytes());
        for file in &self.files {
            hasher.update([0u8]);
            hasher.update(file.path.as_bytes());
            hasher.update([0u8]);
            hasher.update(file.content.as_bytes());
        }
        let result = hasher.finalize();
        format!("{:x}", result)
    }
}

fn target_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Write the bundle under `out_dir/<root directory name>`.
///
/// Existing files are only replaced with `force`; without it the first
/// conflict aborts before anything is written.
pub fn write_bundle(bundle: &ArtifactBundle, out_dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let root = out_dir.join(&bundle.root_directory_name);

    if !force {
        let existing: Vec<&str> = bundle
            .paths()
            .filter(|p| target_path(&root, p).exists())
            .collect();
        if !existing.is_empty() {
            bail!(
                "{} file(s) already exist under {} (use --force to overwrite): {}",
                existing.len(),
                root.display(),
                existing.join(", ")
            );
        }
    }

    for file in bundle.files() {
        let dest = target_path(&root, &file.path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(&dest, &file.content)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
    }

    info!(
        root = %root.display(),
        files = bundle.len(),
        fingerprint = %bundle.fingerprint(),
        "bundle written"
    );
    Ok(root)
}
