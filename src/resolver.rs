//! Change-driven build-root resolution
//!
//! A changed file triggers every directory on its path that holds a marker
//! file, not just its immediate parent: `svc/api/handlers/users.go` can
//! trigger `svc/api` even though nothing directly inside `svc/api` changed.
//!
//! Resolution happens in two steps:
//! 1. [`candidate_dirs`] expands every changed path into its directory and
//!    the full ancestor chain, stopping short of the repository root.
//! 2. [`resolve_build_roots`] keeps the candidates that directly contain the
//!    marker file.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::git::{Change, Snapshot};

/// A directory, relative to the repository root, that holds a marker file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildRoot(String);

impl BuildRoot {
    pub fn new(path: &str) -> Self {
        Self(normalize_dir(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answers whether a directory directly contains the marker file
pub trait MarkerProbe {
    fn has_marker_at(&self, dir: &str) -> Result<bool>;
}

impl MarkerProbe for Snapshot {
    fn has_marker_at(&self, dir: &str) -> Result<bool> {
        Snapshot::has_marker_at(self, dir)
    }
}

/// Strip `./` prefixes, duplicate separators and trailing slashes.
fn normalize_dir(path: &str) -> String {
    path.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory containing `path`; empty for files at the repository root
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// `dir` and all of its ancestors, excluding the repository root
fn ancestry(dir: &str) -> impl Iterator<Item = &str> {
    std::iter::successors((!dir.is_empty()).then_some(dir), |current| {
        current.rsplit_once('/').map(|(parent, _)| parent)
    })
}

/// Expand changed paths into the deduplicated set of directories they touch.
pub fn candidate_dirs(changes: &[Change]) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    for change in changes {
        for path in change.paths() {
            let path = normalize_dir(path);
            for dir in ancestry(parent_dir(&path)) {
                if !candidates.contains(dir) {
                    candidates.insert(dir.to_string());
                }
            }
        }
    }
    candidates
}

/// Resolve the build roots affected by `changes`.
///
/// The result is sorted and free of duplicates; candidates without a marker
/// file are dropped silently.
pub fn resolve_build_roots<P: MarkerProbe + ?Sized>(
    probe: &P,
    changes: &[Change],
) -> Result<Vec<BuildRoot>> {
    let candidates = candidate_dirs(changes);
    debug!("Found changed dirs: {candidates:?}");

    let mut roots = Vec::new();
    for dir in candidates {
        debug!("Checking path: {dir}");
        if probe.has_marker_at(&dir)? {
            roots.push(BuildRoot(dir));
        }
    }
    Ok(roots)
}
