//! Git error interpretation
//!
//! libgit2 messages are terse and inconsistent across transports. They are
//! classified into a handful of reasons an operator can act on.

use git2::{Error, ErrorClass, ErrorCode};

#[derive(Clone, Copy)]
enum Reason {
    RepositoryNotFound,
    BranchNotFound,
    AuthenticationFailed,
    PermissionDenied,
    NetworkError,
    HttpCertificate,
    HttpSsl,
    Other(ErrorClass),
}

type Check = fn(&str, ErrorClass) -> bool;

const CLASSIFICATIONS: &[(Check, Reason)] = &[
    (
        |msg, _| msg.contains("remote branch") || msg.contains("reference 'refs/"),
        Reason::BranchNotFound,
    ),
    (
        |msg, _| {
            msg.contains("not found")
                || msg.contains("404")
                || msg.contains("too many redirects")
                || msg.contains("does not appear to be a git repository")
        },
        Reason::RepositoryNotFound,
    ),
    (
        |msg, class| {
            msg.contains("authentication")
                || msg.contains("credentials")
                || (class == ErrorClass::Ssh && msg.contains("key"))
        },
        Reason::AuthenticationFailed,
    ),
    (
        |msg, _| msg.contains("permission denied") || msg.contains("access denied"),
        Reason::PermissionDenied,
    ),
    (
        |msg, _| {
            msg.contains("connection")
                || msg.contains("network")
                || msg.contains("timeout")
                || msg.contains("timed out")
        },
        Reason::NetworkError,
    ),
    (
        |msg, class| class == ErrorClass::Http && msg.contains("certificate"),
        Reason::HttpCertificate,
    ),
    (
        |msg, class| class == ErrorClass::Http && msg.contains("ssl"),
        Reason::HttpSsl,
    ),
];

fn classify(msg: &str, class: ErrorClass) -> Reason {
    CLASSIFICATIONS
        .iter()
        .find(|(check, _)| check(msg, class))
        .map_or(Reason::Other(class), |(_, reason)| *reason)
}

/// Turn a git2 error from a clone into a readable reason
pub fn interpret_git_error(err: &Error) -> String {
    if err.code() == ErrorCode::Auth {
        return "Authentication failed".to_string();
    }

    let message = err.message().to_lowercase();
    match classify(&message, err.class()) {
        Reason::RepositoryNotFound => "Repository not found".to_string(),
        Reason::BranchNotFound => format!("Branch not found: {}", err.message()),
        Reason::AuthenticationFailed => "Authentication failed".to_string(),
        Reason::PermissionDenied => "Permission denied".to_string(),
        Reason::NetworkError => "Network error".to_string(),
        Reason::HttpCertificate => "Certificate error".to_string(),
        Reason::HttpSsl => "SSL error".to_string(),
        Reason::Other(ErrorClass::Http) => format!("HTTP error: {}", err.message()),
        Reason::Other(ErrorClass::Ssh) => format!("SSH error: {}", err.message()),
        Reason::Other(_) => err.message().to_string(),
    }
}
