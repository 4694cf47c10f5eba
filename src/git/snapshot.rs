//! Read-only view of a repository at the head of one branch

use std::path::Path;

use git2::{Delta, DiffFindOptions, DiffOptions, ObjectType, Oid, Repository, Tree};
use tempfile::TempDir;
use tracing::debug;

use super::clone::{branch_ref, clone_branch};
use crate::config::Config;
use crate::error::{Result, diff_failed, transport_failed};

/// Name of the file that makes a directory a build root
pub const MARKER_FILE: &str = "Dockerfile";

const GIT_MODE_FILE: i32 = 0o100_644;
const GIT_MODE_EXECUTABLE: i32 = 0o100_755;
const GIT_MODE_GROUP_WRITABLE: i32 = 0o100_664;

/// Whether a tree entry mode denotes a regular file (not a symlink or submodule)
pub fn is_regular_file(mode: i32) -> bool {
    matches!(mode, GIT_MODE_FILE | GIT_MODE_EXECUTABLE | GIT_MODE_GROUP_WRITABLE)
}

/// Whether a regular file mode carries the executable bit
pub fn is_executable(mode: i32) -> bool {
    mode == GIT_MODE_EXECUTABLE
}

/// A single file-level delta between the snapshot tree and one parent tree.
///
/// Both paths present means a modification or rename, only `to` an
/// addition, only `from` a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Change {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Change {
    pub fn added(path: impl Into<String>) -> Self {
        Self {
            from: None,
            to: Some(path.into()),
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            from: Some(path.into()),
            to: None,
        }
    }

    pub fn modified(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }

    /// The paths present on this change
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.from.iter().chain(self.to.iter()).map(String::as_str)
    }
}

/// Immutable view of a cloned branch head.
///
/// The clone lives in a private temporary directory that is removed when the
/// snapshot is dropped.
pub struct Snapshot {
    // Declared before `_dir` so the repository is closed before its directory is removed.
    repo: Repository,
    commit_id: Oid,
    reference: String,
    _dir: TempDir,
}

impl Snapshot {
    /// Clone `branch` of `url` and resolve its head commit.
    pub fn open(url: &str, branch: &str, key_path: Option<&Path>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("image-builder-")
            .tempdir_in(crate::temp::temp_dir_base())
            .map_err(|e| transport_failed(url, format!("Failed to create clone directory: {e}")))?;

        let repo = clone_branch(url, branch, key_path, dir.path())?;
        let reference = branch_ref(branch);
        let commit_id = resolve_head(&repo, &reference)
            .map_err(|e| {
                transport_failed(url, format!("Cannot resolve {reference}: {}", e.message()))
            })?;
        debug!(commit = %commit_id, "Resolved {reference}");

        Ok(Self {
            repo,
            commit_id,
            reference,
            _dir: dir,
        })
    }

    /// Clone the repository named by the run configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.git_url, &config.git_branch, config.key_path.as_deref())
    }

    /// Full lowercase hex identifier of the head commit
    pub fn commit_id(&self) -> String {
        self.commit_id.to_string()
    }

    /// Fully qualified reference name, e.g. `refs/heads/main`
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub(crate) fn repository(&self) -> &Repository {
        &self.repo
    }

    fn tree(&self) -> Result<Tree<'_>> {
        self.repo
            .find_commit(self.commit_id)
            .and_then(|commit| commit.tree())
            .map_err(|e| diff_failed("", e.message()))
    }

    /// Union of the file-level changes between the head commit and each of
    /// its parents.
    ///
    /// A root commit is compared against the empty tree, so every file shows
    /// up as an addition.
    pub fn changes_against_parents(&self) -> Result<Vec<Change>> {
        let commit = self
            .repo
            .find_commit(self.commit_id)
            .map_err(|e| diff_failed("", e.message()))?;
        let tree = self.tree()?;

        if commit.parent_count() == 0 {
            debug!("Root commit, diffing against the empty tree");
            return self.diff(None, &tree);
        }

        let mut changes = Vec::new();
        for parent in commit.parents() {
            let parent_tree = parent.tree().map_err(|e| diff_failed("", e.message()))?;
            changes.extend(self.diff(Some(&parent_tree), &tree)?);
        }
        Ok(changes)
    }

    fn diff(&self, old: Option<&Tree<'_>>, new: &Tree<'_>) -> Result<Vec<Change>> {
        let mut opts = DiffOptions::new();
        opts.include_typechange(true);

        let mut diff = self
            .repo
            .diff_tree_to_tree(old, Some(new), Some(&mut opts))
            .map_err(|e| diff_failed("", e.message()))?;
        diff.find_similar(Some(DiffFindOptions::new().renames(true)))
            .map_err(|e| diff_failed("", e.message()))?;

        let mut changes = Vec::with_capacity(diff.deltas().len());
        for delta in diff.deltas() {
            let from = delta_path(delta.old_file().path())?;
            let to = delta_path(delta.new_file().path())?;
            let change = match delta.status() {
                Delta::Added | Delta::Untracked => Change { from: None, to },
                Delta::Deleted => Change { from, to: None },
                _ => Change { from, to },
            };
            changes.push(change);
        }
        Ok(changes)
    }

    /// Whether `dir` directly contains the marker file.
    pub fn has_marker_at(&self, dir: &str) -> Result<bool> {
        let tree = self.tree()?;
        let marker = if dir.is_empty() {
            MARKER_FILE.to_string()
        } else {
            format!("{dir}/{MARKER_FILE}")
        };

        match tree.get_path(Path::new(&marker)) {
            Ok(entry) => {
                let found =
                    entry.kind() == Some(ObjectType::Blob) && is_regular_file(entry.filemode());
                debug!("{} {MARKER_FILE} at path: {dir}", if found { "Found" } else { "No" });
                Ok(found)
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                debug!("No {MARKER_FILE} at path: {dir}");
                Ok(false)
            }
            Err(e) => Err(diff_failed(dir, e.message())),
        }
    }

    /// Resolve the subtree at `dir`; the empty path is the repository root.
    pub fn read_subtree(&self, dir: &str) -> Result<Tree<'_>> {
        let tree = self.tree()?;
        if dir.is_empty() {
            return Ok(tree);
        }

        let entry = tree
            .get_path(Path::new(dir))
            .map_err(|e| diff_failed(dir, e.message()))?;
        if entry.kind() != Some(ObjectType::Tree) {
            return Err(diff_failed(dir, "not a directory"));
        }
        entry
            .to_object(&self.repo)
            .and_then(|object| object.peel_to_tree())
            .map_err(|e| diff_failed(dir, e.message()))
    }
}

fn resolve_head(repo: &Repository, reference: &str) -> std::result::Result<Oid, git2::Error> {
    let remote_ref = reference.replacen("refs/heads/", "refs/remotes/origin/", 1);
    let commit = repo
        .find_reference(reference)
        .or_else(|_| repo.find_reference(&remote_ref))?
        .peel_to_commit()?;
    Ok(commit.id())
}

fn delta_path(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|p| {
        p.to_str()
            .map(|s| s.replace('\\', "/"))
            .ok_or_else(|| diff_failed(p.display().to_string(), "path is not valid UTF-8"))
    })
    .transpose()
}
