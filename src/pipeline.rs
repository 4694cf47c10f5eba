//! Build-then-push pipeline for a single build root
//!
//! ```text
//! Idle -> Building -> Built -> Pushing -> Done
//!            |                   |
//!            +------> Failed <---+
//! ```
//!
//! A push can only start from `Built`, so an image whose build reported an
//! error is never pushed.

use std::fmt;
use std::io::BufReader;

use tracing::{debug, info};

use crate::archive::{self, ArchiveStream};
use crate::config::Config;
use crate::engine::{BuildStatus, ContainerEngine, PushStatus, decode_stream};
use crate::error::{ImageBuilderError, Operation, Result};
use crate::git::Snapshot;
use crate::resolver::BuildRoot;
use crate::tags::tags_for;

/// Where a build root is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Building,
    Built,
    Pushing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Building => "building",
            Stage::Built => "built",
            Stage::Pushing => "pushing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Pipeline state for one build root and its tags
#[derive(Debug)]
pub struct RootPipeline {
    root: BuildRoot,
    tags: Vec<String>,
    stage: Stage,
}

impl RootPipeline {
    pub fn new(root: BuildRoot, tags: Vec<String>) -> Self {
        Self {
            root,
            tags,
            stage: Stage::Idle,
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, expected: Stage, next: Stage) -> Result<()> {
        if self.stage != expected {
            return Err(ImageBuilderError::StageViolation {
                root: self.root.to_string(),
                expected: expected.to_string(),
                actual: self.stage.to_string(),
            });
        }
        debug!(root = %self.root, "{} -> {next}", self.stage);
        self.stage = next;
        Ok(())
    }

    fn settle<T>(&mut self, result: Result<T>, success: Stage) -> Result<T> {
        self.stage = if result.is_ok() { success } else { Stage::Failed };
        debug!(root = %self.root, "-> {}", self.stage);
        result
    }

    /// Build `context` into an image carrying every tag.
    pub fn build<E: ContainerEngine>(&mut self, engine: &E, context: ArchiveStream) -> Result<()> {
        self.enter(Stage::Idle, Stage::Building)?;
        info!("Building {} as {:?}", self.root, self.tags);

        let result = engine
            .build_image(context, &self.tags)
            .and_then(|stream| {
                decode_stream::<BuildStatus, _>(
                    BufReader::new(stream),
                    Operation::Build,
                    self.root.as_str(),
                )
            })
            .map(|lines| debug!("Build of {} finished after {lines} status lines", self.root));
        self.settle(result, Stage::Built)
    }

    /// Push every tag of the built image in one registry call.
    pub fn push<E: ContainerEngine>(
        &mut self,
        engine: &E,
        registry_auth: Option<&str>,
    ) -> Result<()> {
        self.enter(Stage::Built, Stage::Pushing)?;
        info!("Pushing {}", self.root);

        let result = engine
            .push_image(self.root.as_str(), registry_auth)
            .and_then(|stream| {
                decode_stream::<PushStatus, _>(
                    BufReader::new(stream),
                    Operation::Push,
                    self.root.as_str(),
                )
            })
            .map(|_| ());
        self.settle(result, Stage::Done)
    }
}

/// Runs build roots of a snapshot through an engine, one after another
pub struct BuildPublishPipeline<'a, E> {
    engine: E,
    config: &'a Config,
}

impl<'a, E: ContainerEngine> BuildPublishPipeline<'a, E> {
    pub fn new(engine: E, config: &'a Config) -> Self {
        Self { engine, config }
    }

    /// Archive, build and push `root`, stopping at the first failure.
    pub fn publish(&self, snapshot: &Snapshot, root: &BuildRoot) -> Result<RootPipeline> {
        let tags = tags_for(root.as_str(), snapshot.reference(), &snapshot.commit_id());
        let mut pipeline = RootPipeline::new(root.clone(), tags);

        let context = archive::archive(snapshot, root)?;
        pipeline.build(&self.engine, context)?;
        pipeline.push(&self.engine, self.config.registry_auth.as_deref())?;

        info!("Published {:?}", pipeline.tags());
        Ok(pipeline)
    }
}
