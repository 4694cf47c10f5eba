//! Error types and handling for image-builder
//!
//! Uses `thiserror` for error definitions and `miette` for diagnostics.
//!
//! The taxonomy follows the stages of a run:
//! - transport: reaching or reading the source repository
//! - diff: computing or reading tree differences
//! - archive: reading a blob or writing a build context entry
//! - protocol: a malformed or prematurely terminated status stream
//! - remote: a well-formed status stream that reports an error
//!
//! Constructors for the common variants live in [`constructors`].

pub mod constructors;

pub use constructors::{
    archive_failed, diff_failed, protocol_failed, remote_failed, transport_failed,
};

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Remote operation a status stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Build,
    Push,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Build => f.write_str("build"),
            Operation::Push => f.write_str("push"),
        }
    }
}

/// Main error type for image-builder operations
#[derive(Error, Diagnostic, Debug)]
pub enum ImageBuilderError {
    #[error("Failed to reach repository {url}: {reason}")]
    #[diagnostic(
        code(image_builder::git::transport),
        help("Check the repository URL, the branch name and the private key")
    )]
    Transport { url: String, reason: String },

    #[error("Failed to read changes at '{path}': {reason}")]
    #[diagnostic(code(image_builder::git::diff))]
    Diff { path: String, reason: String },

    #[error("Failed to archive build root '{root}': {reason}")]
    #[diagnostic(code(image_builder::archive::failed))]
    Archive { root: String, reason: String },

    #[error("Malformed {operation} status stream for '{target}': {reason}")]
    #[diagnostic(code(image_builder::engine::protocol))]
    Protocol {
        operation: Operation,
        target: String,
        reason: String,
    },

    #[error("{operation} of '{target}' failed: {message}")]
    #[diagnostic(code(image_builder::engine::remote))]
    Remote {
        operation: Operation,
        target: String,
        message: String,
    },

    #[error("Build root '{root}' is {actual}, expected {expected}")]
    #[diagnostic(code(image_builder::pipeline::stage))]
    StageViolation {
        root: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(image_builder::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to read configuration file: {path}: {reason}")]
    #[diagnostic(code(image_builder::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(
        code(image_builder::config::parse_failed),
        help("Keys are kebab-case, e.g. git-url, git-branch, key-path")
    )]
    ConfigParseFailed { path: String, reason: String },
}

impl ImageBuilderError {
    /// Whether the error aborts the whole run rather than a single build root
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            ImageBuilderError::Transport { .. }
                | ImageBuilderError::Diff { .. }
                | ImageBuilderError::ConfigInvalid { .. }
                | ImageBuilderError::ConfigReadFailed { .. }
                | ImageBuilderError::ConfigParseFailed { .. }
        )
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ImageBuilderError>;
