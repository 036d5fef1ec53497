use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;

use crate::services::credentials::Credentials;
use crate::services::project_id::ProjectId;

use super::{GooglePublicKeys, IdTokenVerifier, VerifiedIdentity, VerifyError};

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const MAX_UID_LENGTH: usize = 128;
const CLOCK_SKEW_SECONDS: u64 = 60;

/// Claims this service reads from a Firebase ID token.
///
/// `iss`, `aud` and `exp` are checked by `jsonwebtoken::Validation`.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: u64,
    #[serde(default)]
    auth_time: Option<u64>,
}

/// Firebase Authentication ID-token verifier bound to one project.
///
/// Built once at startup and shared through `AppState`.
pub struct FirebaseAuth {
    project_id: ProjectId,
    credentials: Credentials,
    keys: GooglePublicKeys,
    validation: Validation,
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("project_id", &self.project_id)
            .field("credentials", &self.credentials)
            .field("keys", &self.keys)
            .finish()
    }
}

impl FirebaseAuth {
    pub fn new(project_id: ProjectId, credentials: Credentials, keys: GooglePublicKeys) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{project_id}")]);
        validation.set_audience(&[project_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = CLOCK_SKEW_SECONDS;

        Self {
            project_id,
            credentials,
            keys,
            validation,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // sub/iat/auth_time: jsonwebtoken が見ない Firebase 固有の制約
    fn check_claims(claims: &IdTokenClaims) -> Result<(), VerifyError> {
        let now = jsonwebtoken::get_current_timestamp();

        if claims.sub.is_empty() {
            return Err(VerifyError::InvalidClaim {
                claim: "sub",
                reason: "empty",
            });
        }
        if claims.sub.chars().count() > MAX_UID_LENGTH {
            return Err(VerifyError::InvalidClaim {
                claim: "sub",
                reason: "longer than 128 characters",
            });
        }
        if claims.iat > now + CLOCK_SKEW_SECONDS {
            return Err(VerifyError::InvalidClaim {
                claim: "iat",
                reason: "issued in the future",
            });
        }
        match claims.auth_time {
            None => Err(VerifyError::InvalidClaim {
                claim: "auth_time",
                reason: "missing",
            }),
            Some(t) if t > now + CLOCK_SKEW_SECONDS => Err(VerifyError::InvalidClaim {
                claim: "auth_time",
                reason: "in the future",
            }),
            Some(_) => Ok(()),
        }
    }
}

#[async_trait]
impl IdTokenVerifier for FirebaseAuth {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;

        let key = self.keys.decoding_key(&kid).await?;
        let data = jsonwebtoken::decode::<IdTokenClaims>(token, &key, &self.validation)?;

        Self::check_claims(&data.claims)?;

        Ok(VerifiedIdentity {
            uid: data.claims.sub,
        })
    }
}
