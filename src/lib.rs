//! image-builder - change-driven container image builds for monorepos
//!
//! Given a repository URL and a branch, the head commit is diffed against
//! its parents, the directories holding a `Dockerfile` on the path of any
//! change are resolved, and each of them is archived straight from the
//! object database, built and pushed.

pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod logging;
pub mod operations;
pub mod pipeline;
pub mod resolver;
pub mod tags;
pub mod temp;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use config::Config;
pub use error::{ImageBuilderError, Result};
