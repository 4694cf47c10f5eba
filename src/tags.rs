//! Image tags for a build root
//!
//! Every image is tagged twice under the build root's repository
//! coordinate: once with the branch and once with the abbreviated commit.

/// Length of the abbreviated commit identifier used in tags
pub const SHORT_HASH_LEN: usize = 7;

const REF_NAMESPACES: &[&str] = &["refs/heads/", "refs/tags/", "refs/remotes/", "refs/"];

/// Branch name without its reference namespace, e.g. `main` for `refs/heads/main`
pub fn branch_short_name(branch: &str) -> &str {
    REF_NAMESPACES
        .iter()
        .find_map(|prefix| branch.strip_prefix(prefix))
        .unwrap_or(branch)
}

/// First seven characters of the lowercase commit identifier.
///
/// # Panics
///
/// Panics if `commit_id` is shorter than seven characters. Commit identifiers
/// are always full-length hashes, so a short one is a bug in the caller.
pub fn short_hash(commit_id: &str) -> String {
    assert!(
        commit_id.len() >= SHORT_HASH_LEN && commit_id.is_char_boundary(SHORT_HASH_LEN),
        "commit identifier '{commit_id}' is shorter than {SHORT_HASH_LEN} characters"
    );
    commit_id[..SHORT_HASH_LEN].to_ascii_lowercase()
}

/// `<root>:<branch>` and `<root>:<short hash>`
pub fn tags_for(root: &str, branch: &str, commit_id: &str) -> Vec<String> {
    vec![
        format!("{root}:{}", branch_short_name(branch)),
        format!("{root}:{}", short_hash(commit_id)),
    ]
}
