//! Bearer token authentication: header lookup → token extraction → verification.
//!
//! Stateless; every call verifies afresh and nothing is retried.

use std::fmt;

use thiserror::Error;

use crate::services::identity::IdTokenVerifier;

use super::RequestHeaders;

/// Subject identifier of an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No usable authorization header (absent, ambiguous, or no token after the space).
    #[error("unauthenticated")]
    Unauthenticated,
    /// A token was presented but the identity provider rejected it.
    #[error("forbidden")]
    Forbidden,
}

/// Positional extraction: second element of the value split on `' '`.
///
/// The scheme word is not checked; `"Basic abc"` yields `abc` and is left to
/// verification to reject.
pub fn extract_bearer_token(value: &str) -> Option<&str> {
    value.split(' ').nth(1).filter(|token| !token.is_empty())
}

pub async fn authenticate(
    headers: &RequestHeaders,
    verifier: &dyn IdTokenVerifier,
) -> Result<UserId, AuthError> {
    let Some(value) = headers.authorization() else {
        tracing::error!("no authorization header");
        return Err(AuthError::Unauthenticated);
    };

    let Some(token) = extract_bearer_token(value) else {
        tracing::error!("malformed authorization header (no token after scheme)");
        return Err(AuthError::Unauthenticated);
    };

    match verifier.verify_id_token(token).await {
        Ok(identity) => Ok(UserId::new(identity.uid)),
        Err(err) => {
            // 詳細はログのみ。呼び出し側には返さない
            tracing::error!(error = %err, "error with authentication");
            Err(AuthError::Forbidden)
        }
    }
}
