//! Change-driven build run
//!
//! The run proceeds strictly in sequence:
//! 1. Clone the configured branch into a snapshot
//! 2. Collect the changes of its head commit against every parent
//! 3. Resolve the affected build roots
//! 4. Build and push each root in turn, stopping at the first failure
//!
//! Images pushed before a failure stay in the registry.

use tracing::info;

use crate::config::Config;
use crate::engine::{ContainerEngine, DockerEngine};
use crate::error::Result;
use crate::git::Snapshot;
use crate::pipeline::BuildPublishPipeline;
use crate::resolver::{BuildRoot, resolve_build_roots};

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Build roots affected by the head commit, sorted
    pub roots: Vec<BuildRoot>,
    /// Tags pushed, per build root, in processing order
    pub published: Vec<(BuildRoot, Vec<String>)>,
}

/// Resolve the build roots affected by the head commit of `snapshot`.
pub fn affected_roots(snapshot: &Snapshot) -> Result<Vec<BuildRoot>> {
    let changes = snapshot.changes_against_parents()?;
    info!(
        commit = %snapshot.commit_id(),
        "{} changed paths in {}",
        changes.len(),
        snapshot.reference()
    );
    resolve_build_roots(snapshot, &changes)
}

/// Build and push every root affected by the head commit of `snapshot`.
pub fn publish_affected<E: ContainerEngine>(
    snapshot: &Snapshot,
    engine: E,
    config: &Config,
) -> Result<RunSummary> {
    let roots = affected_roots(snapshot)?;
    info!("Build roots: {:?}", roots.iter().map(BuildRoot::as_str).collect::<Vec<_>>());

    let pipeline = BuildPublishPipeline::new(engine, config);
    let mut published = Vec::with_capacity(roots.len());
    for root in &roots {
        let done = pipeline.publish(snapshot, root)?;
        published.push((root.clone(), done.tags().to_vec()));
    }

    Ok(RunSummary { roots, published })
}

/// Run the whole build for `config`.
///
/// With `dry_run` set, only the affected roots are resolved.
pub fn run(config: &Config) -> Result<RunSummary> {
    let snapshot = Snapshot::from_config(config)?;

    if config.dry_run {
        let roots = affected_roots(&snapshot)?;
        return Ok(RunSummary {
            roots,
            published: Vec::new(),
        });
    }

    let engine = DockerEngine::from_config(config)?;
    publish_affected(&snapshot, engine, config)
}
