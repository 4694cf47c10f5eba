//! Repository URL handling
//!
//! libgit2 does not accept SCP-style SSH addresses (`git@host:path`), so they
//! are rewritten to explicit `ssh://` URLs before cloning. Local paths are
//! passed through untouched.

use std::borrow::Cow;

/// Rewrite a repository URL into a form libgit2 accepts.
pub fn normalize_clone_url(url: &str) -> Cow<'_, str> {
    if url.contains("://") {
        return Cow::Borrowed(url);
    }

    let Some((user_host, path)) = url.split_once(':') else {
        return Cow::Borrowed(url);
    };

    // `C:\repo` and `/srv/repo:x` are paths, not SCP addresses
    if !user_host.contains('@') || user_host.contains('/') {
        return Cow::Borrowed(url);
    }

    let path = path.strip_prefix('/').unwrap_or(path);
    Cow::Owned(format!("ssh://{user_host}/{path}"))
}

/// Whether the URL points at the local filesystem
pub fn is_local(url: &str) -> bool {
    url.starts_with("file://") || url.starts_with('/') || std::path::Path::new(url).is_absolute()
}
