//! CLI definitions using clap derive API

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// image-builder - build and push images for changed sub-projects
///
/// Clones one branch of a repository, finds the directories holding a
/// Dockerfile that were touched by the latest commit, then builds and pushes
/// an image for each of them.
#[derive(Parser, Debug)]
#[command(
    name = "image-builder",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Build and push images for the sub-projects touched by the latest commit",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  image-builder -g git@github.com:org/mono.git -b main --dry-run\n   \
                  image-builder -g https://github.com/org/mono.git -k ~/.ssh/deploy \
                  --registry-auth \"$AUTH\"\n"
)]
pub struct Cli {
    /// Config file (default is $HOME/.image-builder.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug mode
    #[arg(long, short = 'd', env = "IB_DEBUG")]
    pub debug: bool,

    /// Log in JSON format
    #[arg(long, short = 'j', env = "IB_JSON")]
    pub json: bool,

    /// Git repo to build
    #[arg(long, short = 'g', env = "IB_GIT_URL", value_name = "URL")]
    pub git_url: Option<String>,

    /// Git branch to build [default: master]
    #[arg(long, short = 'b', env = "IB_GIT_BRANCH", value_name = "NAME")]
    pub git_branch: Option<String>,

    /// Path to private key
    #[arg(long, short = 'k', env = "IB_KEY_PATH", value_name = "PATH")]
    pub key_path: Option<PathBuf>,

    /// Container engine endpoint: tcp://, http:// or https://; unix sockets are not
    /// supported [default: tcp://localhost:2375]
    #[arg(long, env = "IB_DOCKER_HOST", value_name = "URL")]
    pub docker_host: Option<String>,

    /// Base64 encoded registry credentials sent with every push
    #[arg(long, env = "IB_REGISTRY_AUTH", value_name = "TOKEN", hide_env_values = true)]
    pub registry_auth: Option<String>,

    /// Print the affected build roots without building anything
    #[arg(long)]
    pub dry_run: bool,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            config_path: cli.config,
            git_url: cli.git_url,
            git_branch: cli.git_branch,
            key_path: cli.key_path,
            docker_host: cli.docker_host,
            registry_auth: cli.registry_auth,
            debug: cli.debug,
            json: cli.json,
            dry_run: cli.dry_run,
        }
    }
}
