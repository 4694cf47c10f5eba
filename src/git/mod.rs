//! Git access for change-driven builds
//!
//! This module handles:
//! - Cloning a single branch without a working tree ([`clone`])
//! - Authenticating with an explicit key or git's native sources ([`auth`])
//! - Reading changes, marker files and subtrees of the head commit ([`snapshot`])

pub mod auth;
pub mod clone;
pub mod error;
pub mod snapshot;
pub mod url;

pub use snapshot::{Change, MARKER_FILE, Snapshot, is_executable, is_regular_file};
