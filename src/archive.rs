//! Build-context archives taken straight from the object database
//!
//! The archive for a build root mirrors the root's subtree at the snapshot
//! commit: one tar entry per regular file, named relative to the root, in
//! git tree order. Headers carry no timestamps or owners, so the same commit
//! always produces the same bytes.

use std::io::{self, Read, Seek, SeekFrom, Write};

use git2::{ObjectType, Repository, Tree};
use tar::{Builder, EntryType, Header};
use tempfile::SpooledTempFile;
use tracing::debug;

use crate::error::{Result, archive_failed};
use crate::git::{Snapshot, is_executable, is_regular_file};
use crate::resolver::BuildRoot;

/// Archives larger than this spill from memory to an anonymous temp file
const SPOOL_THRESHOLD: usize = 8 * 1024 * 1024;


/// A finished build-context archive, readable from the start.
#[derive(Debug)]
pub struct ArchiveStream {
    inner: SpooledTempFile,
    len: u64,
    entries: usize,
}

impl ArchiveStream {
    /// Total archive size in bytes, trailer included
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the archive holds no file entries; the trailer is always present
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of file entries written
    pub fn entries(&self) -> usize {
        self.entries
    }
}

impl Read for ArchiveStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Archive the subtree at `root` as it exists in `snapshot`.
pub fn archive(snapshot: &Snapshot, root: &BuildRoot) -> Result<ArchiveStream> {
    let tree = snapshot
        .read_subtree(root.as_str())
        .map_err(|e| archive_failed(root.as_str(), e.to_string()))?;
    archive_tree(snapshot.repository(), &tree, root.as_str())
}

pub(crate) fn archive_tree(
    repo: &Repository,
    tree: &Tree<'_>,
    root: &str,
) -> Result<ArchiveStream> {
    let mut builder = Builder::new(SpooledTempFile::new(SPOOL_THRESHOLD));
    let entries = append_tree(&mut builder, repo, tree, "", root)?;

    // `into_inner` writes the two zero blocks that terminate the archive.
    let mut inner = builder
        .into_inner()
        .map_err(|e| archive_failed(root, format!("Failed to finish archive: {e}")))?;
    let len = inner
        .seek(SeekFrom::End(0))
        .and_then(|len| inner.seek(SeekFrom::Start(0)).map(|_| len))
        .map_err(|e| archive_failed(root, format!("Failed to rewind archive: {e}")))?;

    debug!("Tar archive for {root} is {len} bytes long ({entries} files)");
    Ok(ArchiveStream { inner, len, entries })
}

fn append_tree<W: Write>(
    builder: &mut Builder<W>,
    repo: &Repository,
    tree: &Tree<'_>,
    prefix: &str,
    root: &str,
) -> Result<usize> {
    let mut written = 0;
    for entry in tree {
        let name = entry
            .name()
            .ok_or_else(|| archive_failed(root, format!("non UTF-8 entry name under '{prefix}'")))?;
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        match entry.kind() {
            Some(ObjectType::Tree) => {
                let subtree = entry
                    .to_object(repo)
                    .and_then(|object| object.peel_to_tree())
                    .map_err(|e| archive_failed(root, format!("{path}: {}", e.message())))?;
                written += append_tree(builder, repo, &subtree, &path, root)?;
            }
            Some(ObjectType::Blob) if is_regular_file(entry.filemode()) => {
                append_file(builder, repo, entry.id(), entry.filemode(), &path, root)?;
                written += 1;
            }
            _ => debug!("Skipping {path}: not a regular file (mode {:o})", entry.filemode()),
        }
    }
    Ok(written)
}

fn append_file<W: Write>(
    builder: &mut Builder<W>,
    repo: &Repository,
    id: git2::Oid,
    git_mode: i32,
    path: &str,
    root: &str,
) -> Result<()> {
    debug!("Adding {path} to tar archive");
    let blob = repo
        .find_blob(id)
        .map_err(|e| archive_failed(root, format!("{path}: {}", e.message())))?;
    let content = blob.content();

    let mut header = Header::new_ustar();
    header.set_entry_type(EntryType::Regular);
    header.set_size(content.len() as u64);
    header.set_mode(if is_executable(git_mode) { 0o755 } else { 0o644 });
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);

    builder
        .append_data(&mut header, path, content)
        .map_err(|e| archive_failed(root, format!("{path}: {e}")))
}
