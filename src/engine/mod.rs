//! Container engine seam
//!
//! The pipeline talks to the engine through [`ContainerEngine`]. Both calls
//! hand back the raw status stream; decoding lives in [`status`] so every
//! engine shares the same failure semantics.

pub mod docker;
pub mod status;

use std::io::Read;

pub use docker::DockerEngine;
pub use status::{BuildStatus, PushStatus, StatusEvent, decode_stream};

use crate::archive::ArchiveStream;
use crate::error::Result;

/// A status stream as returned by the engine
pub type StatusStream = Box<dyn Read>;

/// Builds images from archives and pushes them to a registry
pub trait ContainerEngine {
    /// Submit `context` as a build tagged with every entry of `tags`.
    fn build_image(&self, context: ArchiveStream, tags: &[String]) -> Result<StatusStream>;

    /// Push every tag of `repository`, authenticating with `registry_auth`.
    fn push_image(&self, repository: &str, registry_auth: Option<&str>) -> Result<StatusStream>;
}

impl<E: ContainerEngine + ?Sized> ContainerEngine for &E {
    fn build_image(&self, context: ArchiveStream, tags: &[String]) -> Result<StatusStream> {
        (**self).build_image(context, tags)
    }

    fn push_image(&self, repository: &str, registry_auth: Option<&str>) -> Result<StatusStream> {
        (**self).push_image(repository, registry_auth)
    }
}
