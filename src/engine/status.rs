//! Decoding of the newline-delimited JSON status streams returned by image
//! build and push requests
//!
//! Each line is decoded on its own as soon as it arrives. A line whose
//! `error` field is non-empty ends decoding immediately; every other line is
//! progress and only logged.

use std::io::BufRead;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Operation, Result, protocol_failed, remote_failed};

/// One line of the build status stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildStatus {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One line of the push status stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A decoded status line
pub trait StatusEvent: DeserializeOwned {
    /// The error reported by this line, if any
    fn error(&self) -> Option<&str>;

    /// Log the progress carried by this line
    fn log(&self);
}

fn non_empty(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|s| !s.is_empty())
}

impl StatusEvent for BuildStatus {
    fn error(&self) -> Option<&str> {
        non_empty(self.error.as_ref())
    }

    fn log(&self) {
        if let Some(stream) = non_empty(self.stream.as_ref()) {
            debug!("{}", stream.trim_end_matches(['\n', '\r']));
        } else if let Some(status) = non_empty(self.status.as_ref()) {
            debug!("{status}");
        }
    }
}

impl StatusEvent for PushStatus {
    fn error(&self) -> Option<&str> {
        non_empty(self.error.as_ref())
    }

    fn log(&self) {
        let layer = self.id.as_deref().unwrap_or_default();
        debug!(layer, "{}", self.status.as_deref().unwrap_or_default());
    }
}

/// Decode `reader` line by line until it ends or reports an error.
///
/// Returns the number of progress lines seen. A reported error becomes a
/// remote error carrying its text verbatim; a read failure or a line that is
/// not a status record becomes a protocol error.
pub fn decode_stream<T: StatusEvent, R: BufRead>(
    reader: R,
    operation: Operation,
    target: &str,
) -> Result<usize> {
    let mut progress = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| {
            protocol_failed(operation, target, format!("Failed to read logs: {e}"))
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: T = serde_json::from_str(line).map_err(|e| {
            protocol_failed(
                operation,
                target,
                format!("Error decoding json from {operation} API: {e}"),
            )
        })?;
        if let Some(message) = event.error() {
            return Err(remote_failed(operation, target, message));
        }
        event.log();
        progress += 1;
    }
    Ok(progress)
}
