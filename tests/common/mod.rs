//! Shared helpers for integration tests: a scripted verifier, body readers, and
//! RS256 token minting with the fixture key in `tests/fixtures/test_rsa_key.pem`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;

use cloudrun_user_auth::services::identity::{IdTokenVerifier, VerifiedIdentity, VerifyError};

pub const TEST_RSA_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_key.pem");
pub const TEST_KID: &str = "test-key-1";
/// Modulus of the fixture key, base64url without padding.
pub const TEST_RSA_N: &str = "40Sw0QUE9qz6YHfGGzeJCPbGvhc7tZjzSauhFB01aWi3aH8UegS2b3gzlTgNUc2BykxVXb-Zo9r2k6rU-RGux0PbqJ6SA21gOJsbwssVCDYyQmJNbGNo3T9oWwvKZ5WECvPhUA_6fQjE2kpL19cKh9WnSH2F7UrnYskcmdQcp_oAyIr--zmngnPNfKFe0OfuaJ8dSNswASRt-Q4O4dQU-uhr60tPGptd7LYwuihUA826AnbthEpnmV9-5LU0RE8hO35zSFXDdOx5wrRB2KIE83liYbKqVwylrLgWZvhbrEbeO7s9xP1Ktf3iHdKeT02R9EeYsC9ahAWSQ0TZ8q8K1Q";
pub const TEST_RSA_E: &str = "AQAB";

/// Verifier with a fixed token → uid table. Counts calls; unknown tokens fail
/// the way a malformed JWT does.
#[derive(Default)]
pub struct ScriptedVerifier {
    tokens: HashMap<String, String>,
    calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn with_token(mut self, token: &str, uid: &str) -> Self {
        self.tokens.insert(token.to_string(), uid.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdTokenVerifier for ScriptedVerifier {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .map(|uid| VerifiedIdentity { uid: uid.clone() })
            .ok_or_else(|| VerifyError::Jwt(jsonwebtoken::errors::ErrorKind::InvalidToken.into()))
    }
}

/// Read response body as string.
pub async fn body_string(response: axum::http::Response<Body>) -> String {
    use http_body_util::BodyExt;

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// JWKS document containing the fixture public key.
pub fn jwks_body() -> serde_json::Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": TEST_KID,
            "n": TEST_RSA_N,
            "e": TEST_RSA_E
        }]
    })
}

pub fn now() -> u64 {
    jsonwebtoken::get_current_timestamp()
}

/// Claims of a valid Firebase ID token for `project_id`.
pub fn id_token_claims(project_id: &str, uid: &str) -> serde_json::Value {
    let now = now();
    json!({
        "iss": format!("https://securetoken.google.com/{project_id}"),
        "aud": project_id,
        "sub": uid,
        "user_id": uid,
        "iat": now - 30,
        "exp": now + 3_600,
        "auth_time": now - 60,
        "firebase": { "sign_in_provider": "password" }
    })
}

pub fn sign(claims: &serde_json::Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(TEST_RSA_KEY_PEM).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}
