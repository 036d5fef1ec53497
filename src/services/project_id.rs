//! Project id resolution (environment first, then the platform metadata server).
//!
//! Resolved once at startup and never refreshed. Any failure here is fatal:
//! the process cannot configure the identity client without a project id.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::MetadataConfig;

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR_VALUE: &str = "Google";

/// Identifier of the hosting cloud project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the project id came from. Credential discovery treats
/// `MetadataServer` as proof that we run on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectIdSource {
    Environment,
    MetadataServer,
}

#[derive(Debug, Clone)]
pub struct ResolvedProjectId {
    pub project_id: ProjectId,
    pub source: ProjectIdSource,
}

#[derive(Debug, Error)]
pub enum ProjectIdError {
    #[error("failed to build metadata http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("metadata request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u128 },

    #[error("metadata request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("metadata server {url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("metadata server {url} returned an empty project id")]
    Empty { url: String },
}

/// Resolve the project id.
///
/// A non-empty `env_value` wins and the metadata server is not contacted.
/// Otherwise a single GET is issued; there is no retry.
pub async fn resolve(
    env_value: Option<&str>,
    metadata: &MetadataConfig,
) -> Result<ResolvedProjectId, ProjectIdError> {
    if let Some(id) = env_value.filter(|v| !v.is_empty()) {
        return Ok(ResolvedProjectId {
            project_id: ProjectId::new(id),
            source: ProjectIdSource::Environment,
        });
    }

    tracing::info!(
        url = %metadata.project_id_url,
        "GOOGLE_CLOUD_PROJECT not set, querying metadata server"
    );

    let project_id = fetch_from_metadata(&metadata.project_id_url, metadata.timeout).await?;

    Ok(ResolvedProjectId {
        project_id,
        source: ProjectIdSource::MetadataServer,
    })
}

async fn fetch_from_metadata(url: &str, timeout: Duration) -> Result<ProjectId, ProjectIdError> {
    let client = reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ProjectIdError::Client)?;

    let map_err = |source: reqwest::Error| {
        if source.is_timeout() {
            ProjectIdError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis(),
            }
        } else {
            ProjectIdError::Http {
                url: url.to_string(),
                source,
            }
        }
    };

    let resp = client
        .get(url)
        .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
        .send()
        .await
        .map_err(map_err)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProjectIdError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    // body はそのまま project id として扱う (trim しない)
    let body = resp.text().await.map_err(map_err)?;
    if body.is_empty() {
        return Err(ProjectIdError::Empty {
            url: url.to_string(),
        });
    }

    Ok(ProjectId::new(body))
}
