//! Docker Engine API client
//!
//! Speaks API version 1.24 over plain HTTP(S). `tcp://` endpoints, as found
//! in `DOCKER_HOST`, are reached over `http://`.

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Body, Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::{ContainerEngine, StatusStream};
use crate::archive::ArchiveStream;
use crate::config::Config;
use crate::error::{ImageBuilderError, Operation, Result, protocol_failed, remote_failed};

const API_VERSION: &str = "v1.24";
const USER_AGENT: &str = concat!("image-builder/", env!("CARGO_PKG_VERSION"));

/// Error body returned by the engine with a non-success status
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for a Docker-compatible engine endpoint
#[derive(Debug, Clone)]
pub struct DockerEngine {
    client: Client,
    base: Url,
}

/// Parse an engine endpoint into the HTTP base URL requests are made against.
pub fn endpoint_url(host: &str) -> Result<Url> {
    let invalid = |reason: String| ImageBuilderError::ConfigInvalid {
        message: format!("docker host '{host}': {reason}"),
    };

    let http = match host.split_once("://") {
        Some(("tcp" | "http", rest)) => format!("http://{rest}"),
        Some(("https", rest)) => format!("https://{rest}"),
        Some((scheme, _)) => {
            return Err(invalid(format!(
                "unsupported scheme '{scheme}', expected tcp, http or https"
            )));
        }
        None => format!("http://{host}"),
    };

    let mut url = Url::parse(&http).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    url.set_path(&format!("/{API_VERSION}/"));
    Ok(url)
}

impl DockerEngine {
    pub fn new(host: &str) -> Result<Self> {
        let base = endpoint_url(host)?;
        // Builds and pushes run for as long as they need.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(None)
            .build()
            .map_err(|e| ImageBuilderError::ConfigInvalid {
                message: format!("cannot create HTTP client: {e}"),
            })?;
        debug!("Using container engine at {base}");
        Ok(Self { client, base })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.docker_host)
    }

    pub fn build_url(&self, tags: &[String]) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/{API_VERSION}/build"));
        {
            let mut query = url.query_pairs_mut();
            for tag in tags {
                query.append_pair("t", tag);
            }
            query.append_pair("rm", "1");
        }
        url
    }

    pub fn push_url(&self, repository: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/{API_VERSION}/images/{repository}/push"));
        url
    }
}

/// Pass a success response through; turn anything else into a remote error.
fn check_status(response: Response, operation: Operation, target: &str) -> Result<StatusStream> {
    let status = response.status();
    if status.is_success() {
        return Ok(Box::new(response));
    }

    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| describe_status(status, &body));
    Err(remote_failed(operation, target, message))
}

fn describe_status(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

impl ContainerEngine for DockerEngine {
    fn build_image(&self, context: ArchiveStream, tags: &[String]) -> Result<StatusStream> {
        let target = tags.first().map_or("", String::as_str);
        let len = context.len();
        debug!("Submitting {len} byte build context for {tags:?}");

        let response = self
            .client
            .post(self.build_url(tags))
            .header("Content-Type", "application/x-tar")
            .body(Body::sized(context, len))
            .send()
            .map_err(|e| {
                protocol_failed(Operation::Build, target, format!("request failed: {e}"))
            })?;
        check_status(response, Operation::Build, target)
    }

    fn push_image(&self, repository: &str, registry_auth: Option<&str>) -> Result<StatusStream> {
        let mut request = self.client.post(self.push_url(repository));
        if let Some(auth) = registry_auth {
            request = request.header("X-Registry-Auth", auth);
        }

        let response = request
            .send()
            .map_err(|e| {
                protocol_failed(Operation::Push, repository, format!("request failed: {e}"))
            })?;
        check_status(response, Operation::Push, repository)
    }
}
