//! Staged output trees.
//!
//! Files are written into a temporary directory created next to each target
//! tree. [`commit_all`] swaps a group of staged directories into place
//! together: previous targets are moved aside first, and any failure puts
//! every previous target back. Dropping an uncommitted tree deletes
//! everything staged and leaves the target alone.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::BuildError;

const STAGING_PREFIX: &str = ".dox-staging-";
const BACKUP_PREFIX: &str = ".dox-previous-";

/// One output tree under construction.
pub struct StagedTree {
    target: PathBuf,
    staging: TempDir,
}

impl StagedTree {
    /// Create a staging directory beside `target`.
    ///
    /// The target's parent directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the directories cannot be created.
    pub fn new(target: &Path) -> Result<Self, BuildError> {
        let parent = parent_dir(target);
        fs::create_dir_all(&parent).map_err(|e| BuildError::io(&parent, e))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| BuildError::io(&parent, e))?;
        Ok(Self {
            target: target.to_path_buf(),
            staging,
        })
    }

    /// Final location of the tree.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Stage a file at `rel_path` and return its final path under the target.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the file cannot be written.
    pub fn write(&self, rel_path: &str, content: &str) -> Result<PathBuf, BuildError> {
        let staged = self.staging.path().join(rel_path);
        if let Some(parent) = staged.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        fs::write(&staged, content).map_err(|e| BuildError::io(&staged, e))?;
        Ok(self.target.join(rel_path))
    }

    /// Replace the target tree with the staged files.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the staged tree cannot be moved into
    /// place. The previous target is kept in that case.
    pub fn commit(self) -> Result<(), BuildError> {
        commit_all(vec![self])
    }
}

/// Swap every staged tree into place, or none of them.
///
/// # Errors
///
/// Returns [`BuildError::Io`] for the first failed move. Trees already
/// swapped in are removed and all previous targets are restored first.
pub fn commit_all(trees: Vec<StagedTree>) -> Result<(), BuildError> {
    for tree in &trees {
        set_public_permissions(tree.staging.path())?;
    }

    let mut backups = Vec::with_capacity(trees.len());
    for tree in &trees {
        match Backup::take(&tree.target) {
            Ok(backup) => backups.push(backup),
            Err(e) => {
                roll_back(&[], &backups);
                return Err(e);
            }
        }
    }

    for (swapped, tree) in trees.iter().enumerate() {
        if let Err(e) = fs::rename(tree.staging.path(), &tree.target) {
            roll_back(&trees[..swapped], &backups);
            return Err(BuildError::io(&tree.target, e));
        }
    }

    for tree in &trees {
        tracing::debug!(path = %tree.target.display(), "Committed output tree");
    }
    Ok(())
}

/// Remove swapped-in trees and move previous targets back.
fn roll_back(swapped: &[StagedTree], backups: &[Backup]) {
    for tree in swapped {
        if let Err(e) = fs::remove_dir_all(&tree.target) {
            tracing::warn!(
                path = %tree.target.display(),
                error = %e,
                "Failed to remove new output tree"
            );
        }
    }
    for backup in backups {
        backup.restore();
    }
}

/// A previous target moved into a temporary directory beside it.
///
/// Dropping the backup deletes the previous tree.
struct Backup {
    target: PathBuf,
    saved: Option<(TempDir, PathBuf)>,
}

impl Backup {
    fn take(target: &Path) -> Result<Self, BuildError> {
        if fs::symlink_metadata(target).is_err() {
            return Ok(Self {
                target: target.to_path_buf(),
                saved: None,
            });
        }
        let parent = parent_dir(target);
        let holder = tempfile::Builder::new()
            .prefix(BACKUP_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| BuildError::io(&parent, e))?;
        let saved = holder.path().join("tree");
        fs::rename(target, &saved).map_err(|e| BuildError::io(target, e))?;
        Ok(Self {
            target: target.to_path_buf(),
            saved: Some((holder, saved)),
        })
    }

    fn restore(&self) {
        if let Some((_, saved)) = &self.saved
            && let Err(e) = fs::rename(saved, &self.target)
        {
            tracing::warn!(
                path = %self.target.display(),
                error = %e,
                "Failed to restore previous output tree"
            );
        }
    }
}

fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Committed trees are world-readable regardless of the tempdir's mode.
#[cfg(unix)]
fn set_public_permissions(path: &Path) -> Result<(), BuildError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| BuildError::io(path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_public_permissions(_path: &Path) -> Result<(), BuildError> {
    Ok(())
}
