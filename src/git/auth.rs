//! Git authentication configuration
//!
//! An explicitly configured private key is offered first. Without one, the
//! native credential sources are tried in order:
//! - SSH agent
//! - SSH keys from ~/.ssh/
//! - Git credential helpers

use std::cell::Cell;
use std::path::{Path, PathBuf};

use git2::{Cred, CredentialType, Error, ErrorClass, ErrorCode, RemoteCallbacks};

/// libgit2 keeps calling the credential callback while the server rejects
/// what it returns; stop after this many attempts.
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

const DEFAULT_SSH_USER: &str = "git";

fn auth_error(message: &str) -> Error {
    Error::new(ErrorCode::Auth, ErrorClass::Ssh, message)
}

fn try_home_ssh_keys(username: &str) -> Result<Cred, Error> {
    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");

    for key_name in &["id_ed25519", "id_rsa", "id_ecdsa"] {
        let private_key = ssh_dir.join(key_name);
        if !private_key.exists() {
            continue;
        }

        let public_key = ssh_dir.join(format!("{key_name}.pub"));
        let public_key_path = public_key.exists().then_some(public_key.as_path());

        if let Ok(cred) = Cred::ssh_key(username, public_key_path, &private_key, None) {
            return Ok(cred);
        }
    }

    Err(auth_error("no usable SSH key found"))
}

fn try_credential_helper(url: &str, username_from_url: Option<&str>) -> Result<Cred, Error> {
    let config = git2::Config::open_default().or_else(|_| git2::Config::new())?;
    Cred::credential_helper(&config, url, username_from_url)
}

/// Install the credential callback on `callbacks`.
///
/// `key_path` is the private key configured for this run, if any.
pub fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks<'_>, key_path: Option<&Path>) {
    let key_path: Option<PathBuf> = key_path.map(Path::to_path_buf);
    let attempts = Cell::new(0usize);

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        attempts.set(attempts.get() + 1);
        if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
            return Err(auth_error("credentials rejected by remote"));
        }

        if allowed_types.contains(CredentialType::USERNAME) {
            return Cred::username(username_from_url.unwrap_or(DEFAULT_SSH_USER));
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or(DEFAULT_SSH_USER);
            if let Some(key) = &key_path {
                return Cred::ssh_key(username, None, key, None);
            }
            return Cred::ssh_key_from_agent(username).or_else(|_| try_home_ssh_keys(username));
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return try_credential_helper(url, username_from_url);
        }

        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        Err(auth_error("no supported authentication method"))
    });
}
