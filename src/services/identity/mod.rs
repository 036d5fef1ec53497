/*
 * Responsibility
 * - ID token 検証の interface (IdTokenVerifier) と、その結果型
 * - 実装は Firebase Authentication (securetoken) の公開鍵で RS256 検証する FirebaseAuth
 * - handler / authenticator は trait 越しに使う (テストでは fake に差し替え)
 */
use async_trait::async_trait;
use thiserror::Error;

pub mod factory;
pub mod firebase;
pub mod keys;

pub use factory::{IdentityError, build_identity_client};
pub use firebase::FirebaseAuth;
pub use keys::{GooglePublicKeys, KeyFetchError};

/// Identity established by a successfully verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
}

/// Any reason an ID token was not accepted.
///
/// Callers are expected to treat every variant the same way (reject the request);
/// the variants exist for logs.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token header has no 'kid'")]
    MissingKeyId,

    #[error("no public key for kid '{0}'")]
    UnknownKeyId(String),

    #[error("invalid '{claim}' claim: {reason}")]
    InvalidClaim {
        claim: &'static str,
        reason: &'static str,
    },

    #[error(transparent)]
    KeyFetch(#[from] KeyFetchError),
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    /// Verify signature, expiry, issuer and audience of `token`.
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}
