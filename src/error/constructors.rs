//! Convenience constructors for the error taxonomy

use super::{ImageBuilderError, Operation};

pub fn transport_failed(url: impl Into<String>, reason: impl Into<String>) -> ImageBuilderError {
    ImageBuilderError::Transport {
        url: url.into(),
        reason: reason.into(),
    }
}

pub fn diff_failed(path: impl Into<String>, reason: impl Into<String>) -> ImageBuilderError {
    ImageBuilderError::Diff {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn archive_failed(root: impl Into<String>, reason: impl Into<String>) -> ImageBuilderError {
    ImageBuilderError::Archive {
        root: root.into(),
        reason: reason.into(),
    }
}

pub fn protocol_failed(
    operation: Operation,
    target: impl Into<String>,
    reason: impl Into<String>,
) -> ImageBuilderError {
    ImageBuilderError::Protocol {
        operation,
        target: target.into(),
        reason: reason.into(),
    }
}

pub fn remote_failed(
    operation: Operation,
    target: impl Into<String>,
    message: impl Into<String>,
) -> ImageBuilderError {
    ImageBuilderError::Remote {
        operation,
        target: target.into(),
        message: message.into(),
    }
}
