//! Test fixtures for building source repositories.
//!
//! Tests need real commit graphs: root commits, renames, merges, symlinks.
//! [`SourceRepo`] writes trees straight into the object database so each
//! commit contains exactly the files listed, with no working tree involved.
//!
//! ```ignore
//! let source = SourceRepo::new();
//! source.commit(&[("svc/api/Dockerfile", "FROM scratch\n")], "initial");
//! let snapshot = source.snapshot();
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use crate::git::Snapshot;

pub const MODE_FILE: i32 = 0o100_644;
pub const MODE_EXECUTABLE: i32 = 0o100_755;
pub const MODE_SYMLINK: i32 = 0o120_000;
pub const MODE_SUBMODULE: i32 = 0o160_000;
const MODE_TREE: i32 = 0o040_000;

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// A source repository whose default branch is `main`
pub struct SourceRepo {
    pub repo: Repository,
    path: PathBuf,
    _temp: TempDir,
}

impl SourceRepo {
    /// # Panics
    ///
    /// Panics if the repository cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let temp = create_temp_dir();
        let path = temp.path().join("source");
        let repo = Repository::init(&path).expect("Failed to init git repository");
        repo.set_head("refs/heads/main").unwrap();
        Self {
            repo,
            path,
            _temp: temp,
        }
    }

    /// URL to clone this repository from
    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Clone `main` into a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::open(&self.url(), "main", None).expect("Failed to open snapshot")
    }

    /// Write a tree holding exactly `files`, given as (path, content, mode).
    pub fn write_tree(&self, files: &[(&str, &[u8], i32)]) -> Oid {
        let owned: Vec<(String, Vec<u8>, i32)> = files
            .iter()
            .map(|(path, content, mode)| ((*path).to_string(), content.to_vec(), *mode))
            .collect();
        self.write_tree_owned(&owned)
    }

    fn write_tree_owned(&self, files: &[(String, Vec<u8>, i32)]) -> Oid {
        let mut builder = self.repo.treebuilder(None).unwrap();
        let mut subdirs: BTreeMap<String, Vec<(String, Vec<u8>, i32)>> = BTreeMap::new();

        for (path, content, mode) in files {
            match path.split_once('/') {
                Some((dir, rest)) => subdirs.entry(dir.to_string()).or_default().push((
                    rest.to_string(),
                    content.clone(),
                    *mode,
                )),
                None if *mode == MODE_SUBMODULE => {
                    let target = self.repo.head().unwrap().target().unwrap();
                    builder.insert(path, target, *mode).unwrap();
                }
                None => {
                    let blob = self.repo.blob(content).unwrap();
                    builder.insert(path, blob, *mode).unwrap();
                }
            }
        }

        for (dir, entries) in subdirs {
            let tree = self.write_tree_owned(&entries);
            builder.insert(&dir, tree, MODE_TREE).unwrap();
        }
        builder.write().unwrap()
    }

    fn create_commit(
        &self,
        update_ref: Option<&str>,
        tree: Oid,
        parents: &[Oid],
        message: &str,
    ) -> Oid {
        let sig = Signature::now("Test", "test@test.com").unwrap();
        let tree = self.repo.find_tree(tree).unwrap();
        let parents: Vec<_> = parents
            .iter()
            .map(|id| self.repo.find_commit(*id).unwrap())
            .collect();
        let parent_refs: Vec<_> = parents.iter().collect();
        self.repo
            .commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn head(&self) -> Option<Oid> {
        self.repo.head().ok().and_then(|head| head.target())
    }

    /// Commit exactly `files` (regular files) on top of `main`.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let entries: Vec<(&str, &[u8], i32)> = files
            .iter()
            .map(|(path, content)| (*path, content.as_bytes(), MODE_FILE))
            .collect();
        self.commit_entries(&entries, message)
    }

    /// Commit exactly `entries`, given as (path, content, mode), on top of `main`.
    pub fn commit_entries(&self, entries: &[(&str, &[u8], i32)], message: &str) -> Oid {
        let tree = self.write_tree(entries);
        let parents: Vec<Oid> = self.head().into_iter().collect();
        self.create_commit(Some("HEAD"), tree, &parents, message)
    }

    /// Commit `files` on top of `parent` without moving any branch.
    pub fn detached_commit(&self, parent: Oid, files: &[(&str, &str)]) -> Oid {
        let entries: Vec<(&str, &[u8], i32)> = files
            .iter()
            .map(|(path, content)| (*path, content.as_bytes(), MODE_FILE))
            .collect();
        let tree = self.write_tree(&entries);
        self.create_commit(None, tree, &[parent], "detached")
    }

    /// Commit a merge of `ours` and `theirs` holding exactly `files` on `main`.
    pub fn merge(&self, ours: Oid, theirs: Oid, files: &[(&str, &str)]) -> Oid {
        let entries: Vec<(&str, &[u8], i32)> = files
            .iter()
            .map(|(path, content)| (*path, content.as_bytes(), MODE_FILE))
            .collect();
        let tree = self.write_tree(&entries);
        self.create_commit(Some("HEAD"), tree, &[ours, theirs], "merge")
    }

    /// Create a branch at the current head of `main`.
    pub fn branch(&self, name: &str) {
        let head = self.repo.find_commit(self.head().unwrap()).unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }
}

impl Default for SourceRepo {
    fn default() -> Self {
        Self::new()
    }
}
