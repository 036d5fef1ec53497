//! Application Default Credentials discovery.
//!
//! Search order:
//! 1. `GOOGLE_APPLICATION_CREDENTIALS` (explicit key file)
//! 2. gcloud well-known file (`application_default_credentials.json`)
//! 3. platform metadata credentials (Cloud Run / GCE)
//!
//! Nothing is exchanged for an access token here. The result only records which
//! principal the identity client is bound to.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::CredentialsConfig;

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("credentials file {path} is missing '{field}'")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("credentials file {path} has unsupported type '{kind}'")]
    UnsupportedType { path: PathBuf, kind: String },

    #[error(
        "could not find default credentials; set GOOGLE_APPLICATION_CREDENTIALS or run on the platform"
    )]
    NotFound,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ServiceAccount {
        client_email: String,
        project_id: Option<String>,
        source: PathBuf,
    },
    AuthorizedUser {
        client_id: String,
        source: PathBuf,
    },
    Metadata,
}

// key material / refresh token は Debug に出さない
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceAccount {
                client_email,
                project_id,
                source,
            } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("project_id", project_id)
                .field("source", source)
                .finish(),
            Self::AuthorizedUser { client_id, source } => f
                .debug_struct("AuthorizedUser")
                .field("client_id", client_id)
                .field("source", source)
                .finish(),
            Self::Metadata => f.write_str("Metadata"),
        }
    }
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceAccount { .. } => "service_account",
            Self::AuthorizedUser { .. } => "authorized_user",
            Self::Metadata => "metadata",
        }
    }

    /// Principal name for logs.
    pub fn principal(&self) -> &str {
        match self {
            Self::ServiceAccount { client_email, .. } => client_email,
            Self::AuthorizedUser { client_id, .. } => client_id,
            Self::Metadata => "default",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    client_email: Option<String>,
    private_key: Option<String>,
    project_id: Option<String>,
    client_id: Option<String>,
    refresh_token: Option<String>,
}

/// Run the ADC search.
///
/// `metadata_reachable` is true when the project id was already served by the
/// metadata server, which is enough evidence that metadata credentials exist.
pub fn discover(
    config: &CredentialsConfig,
    metadata_reachable: bool,
) -> Result<Credentials, CredentialsError> {
    if let Some(path) = &config.explicit_path {
        // explicit path は存在しなければ致命的 (fallback しない)
        return load_file(path);
    }

    if let Some(dir) = &config.gcloud_config_dir {
        let path = dir.join(WELL_KNOWN_FILE);
        if path.is_file() {
            return load_file(&path);
        }
    }

    if config.on_platform || metadata_reachable {
        return Ok(Credentials::Metadata);
    }

    Err(CredentialsError::NotFound)
}

fn load_file(path: &Path) -> Result<Credentials, CredentialsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CredentialsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file: CredentialsFile =
        serde_json::from_str(&raw).map_err(|source| CredentialsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let required = |value: Option<String>, field: &'static str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CredentialsError::MissingField {
                path: path.to_path_buf(),
                field,
            })
    };

    match file.kind.as_deref() {
        Some("service_account") => {
            let client_email = required(file.client_email, "client_email")?;
            required(file.private_key, "private_key")?;
            Ok(Credentials::ServiceAccount {
                client_email,
                project_id: file.project_id,
                source: path.to_path_buf(),
            })
        }
        Some("authorized_user") => {
            let client_id = required(file.client_id, "client_id")?;
            required(file.refresh_token, "refresh_token")?;
            Ok(Credentials::AuthorizedUser {
                client_id,
                source: path.to_path_buf(),
            })
        }
        Some(other) => Err(CredentialsError::UnsupportedType {
            path: path.to_path_buf(),
            kind: other.to_string(),
        }),
        None => Err(CredentialsError::MissingField {
            path: path.to_path_buf(),
            field: "type",
        }),
    }
}
