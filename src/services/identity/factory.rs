//! Factory: build the process-wide `FirebaseAuth` from the resolved project id,
//! discovered credentials and `IdentityConfig`.

use std::sync::Arc;

use thiserror::Error;

use crate::config::IdentityConfig;
use crate::services::credentials::Credentials;
use crate::services::identity::{FirebaseAuth, GooglePublicKeys};
use crate::services::project_id::ProjectId;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to build identity http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub fn build_identity_client(
    project_id: &ProjectId,
    credentials: Credentials,
    config: &IdentityConfig,
) -> Result<Arc<FirebaseAuth>, IdentityError> {
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let keys = GooglePublicKeys::new(http, config.jwks_url.clone());
    let auth = FirebaseAuth::new(project_id.clone(), credentials, keys);

    tracing::info!(
        project_id = %auth.project_id(),
        credentials = auth.credentials().kind(),
        principal = auth.credentials().principal(),
        jwks_url = %config.jwks_url,
        "identity client initialized"
    );

    Ok(Arc::new(auth))
}
