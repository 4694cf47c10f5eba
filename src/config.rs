//! Run configuration
//!
//! A [`Config`] is built once at startup and handed by reference to the
//! snapshot, the engine and the pipeline. Values are layered, highest first:
//! command-line flags and `IB_*` environment variables (both resolved by
//! clap into [`ConfigOverrides`]), the YAML config file, then defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ImageBuilderError, Result};

/// Config file looked up in the home directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = ".image-builder.yaml";

pub const DEFAULT_BRANCH: &str = "master";

pub const DEFAULT_DOCKER_HOST: &str = "tcp://localhost:2375";

/// Contents of the YAML config file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub git_url: Option<String>,
    pub git_branch: Option<String>,
    pub key_path: Option<PathBuf>,
    pub docker_host: Option<String>,
    pub registry_auth: Option<String>,
    pub debug: Option<bool>,
    pub json: Option<bool>,
}

impl ConfigFile {
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ImageBuilderError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub git_url: Option<String>,
    pub git_branch: Option<String>,
    pub key_path: Option<PathBuf>,
    pub docker_host: Option<String>,
    pub registry_auth: Option<String>,
    pub debug: bool,
    pub json: bool,
    pub dry_run: bool,
}

/// Validated configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub git_url: String,
    pub git_branch: String,
    pub key_path: Option<PathBuf>,
    pub docker_host: String,
    pub registry_auth: Option<String>,
    pub debug: bool,
    pub json: bool,
    pub dry_run: bool,
}

impl Config {
    /// Read the config file, if any, and layer `overrides` on top of it.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => Some(read_config_file(path)?),
            None => default_config_path()
                .filter(|path| path.is_file())
                .map(|path| read_config_file(&path))
                .transpose()?,
        };
        Self::resolve(overrides, file.unwrap_or_default())
    }

    /// Merge `overrides` over `file` and validate the result.
    pub fn resolve(overrides: ConfigOverrides, file: ConfigFile) -> Result<Self> {
        let git_url = overrides
            .git_url
            .or(file.git_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| invalid("--git-url must be set"))?;

        let git_branch = overrides
            .git_branch
            .or(file.git_branch)
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        if git_branch.trim().is_empty() {
            return Err(invalid("--git-branch must not be empty"));
        }

        let docker_host = overrides
            .docker_host
            .or(file.docker_host)
            .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string());
        crate::engine::docker::endpoint_url(&docker_host)?;

        Ok(Self {
            git_url,
            git_branch,
            key_path: overrides.key_path.or(file.key_path),
            docker_host,
            registry_auth: overrides.registry_auth.or(file.registry_auth),
            debug: overrides.debug || file.debug.unwrap_or(false),
            json: overrides.json || file.json.unwrap_or(false),
            dry_run: overrides.dry_run,
        })
    }
}

fn invalid(message: &str) -> ImageBuilderError {
    ImageBuilderError::ConfigInvalid {
        message: message.to_string(),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).map_err(|e| ImageBuilderError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    ConfigFile::from_yaml(path, &content)
}
