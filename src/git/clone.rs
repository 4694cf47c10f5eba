//! Single-branch bare cloning
//!
//! The repository is cloned without a working tree into a private directory
//! the caller owns. Only the requested branch is fetched.

use std::path::Path;

use git2::{FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder};
use tracing::{debug, info};

use super::auth::setup_auth_callbacks;
use super::error::interpret_git_error;
use super::url::{is_local, normalize_clone_url};
use crate::error::{Result, transport_failed};

/// Fully qualified reference name for a branch
pub fn branch_ref(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{branch}")
    }
}

/// Clone `branch` of `url` as a bare repository into `target`.
pub fn clone_branch(
    url: &str,
    branch: &str,
    key_path: Option<&Path>,
    target: &Path,
) -> Result<Repository> {
    let reference = branch_ref(branch);
    let short = reference.strip_prefix("refs/heads/").unwrap_or(branch).to_string();
    info!("Cloning {url} ({reference})");

    // Local clones never authenticate.
    let key_path = if is_local(url) {
        if key_path.is_some() {
            debug!("Ignoring private key for local repository {url}");
        }
        None
    } else {
        key_path
    };

    if let Some(key) = key_path {
        check_key(url, key)?;
    }

    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks, key_path);

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    let refspec = format!("+{reference}:refs/remotes/origin/{short}");
    let mut builder = RepoBuilder::new();
    builder
        .bare(true)
        .branch(&short)
        .fetch_options(fetch_options)
        .remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));

    let url_to_clone = normalize_clone_url(url);
    builder
        .clone(url_to_clone.as_ref(), target)
        .map_err(|e| transport_failed(url, interpret_git_error(&e)))
}

/// Fail fast on a private key that cannot be read, before any connection.
fn check_key(url: &str, key: &Path) -> Result<()> {
    let content = std::fs::read(key)
        .map_err(|e| transport_failed(url, format!("Cannot read {}: {e}", key.display())))?;
    if content.is_empty() {
        return Err(transport_failed(
            url,
            format!("Cannot read {}: key file is empty", key.display()),
        ));
    }
    Ok(())
}
