//! Firebase ID-token verification against a mocked JWKS endpoint, and the full
//! `POST /` path running on the real verifier.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cloudrun_user_auth::app::build_router;
use cloudrun_user_auth::config::IdentityConfig;
use cloudrun_user_auth::services::credentials::Credentials;
use cloudrun_user_auth::services::identity::{
    FirebaseAuth, IdTokenVerifier, KeyFetchError, VerifyError, build_identity_client,
};
use cloudrun_user_auth::services::project_id::ProjectId;
use cloudrun_user_auth::state::AppState;

use common::{TEST_KID, body_string, id_token_claims, jwks_body, now, sign};

const PROJECT: &str = "demo-project";
const JWKS_PATH: &str = "/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

async fn mount_jwks(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "public, max-age=3600, must-revalidate")
                .set_body_json(jwks_body()),
        )
        .expect(expected_fetches)
        .mount(server)
        .await;
}

fn verifier(server: &MockServer) -> std::sync::Arc<FirebaseAuth> {
    let config = IdentityConfig {
        jwks_url: format!("{}{}", server.uri(), JWKS_PATH),
        http_timeout: Duration::from_secs(5),
    };
    build_identity_client(&ProjectId::new(PROJECT), Credentials::Metadata, &config).unwrap()
}

#[tokio::test]
async fn valid_token_yields_uid() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let token = sign(&id_token_claims(PROJECT, "user-42"), Some(TEST_KID));
    let identity = verifier(&server).verify_id_token(&token).await.unwrap();
    assert_eq!(identity.uid, "user-42");
}

#[tokio::test]
async fn key_set_is_reused_within_max_age() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let verifier = verifier(&server);
    for uid in ["alice", "bob", "carol"] {
        let token = sign(&id_token_claims(PROJECT, uid), Some(TEST_KID));
        assert_eq!(verifier.verify_id_token(&token).await.unwrap().uid, uid);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cold_lookups_share_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "public, max-age=3600")
                .set_body_json(jwks_body())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let verifier = verifier(&server);
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let verifier = verifier.clone();
        let token = sign(&id_token_claims(PROJECT, &format!("user-{i}")), Some(TEST_KID));
        tasks.spawn(async move { verifier.verify_id_token(&token).await });
    }

    let mut verified = 0;
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
        verified += 1;
    }
    assert_eq!(verified, 20);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn wrong_audience_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let mut claims = id_token_claims(PROJECT, "user-42");
    claims["aud"] = "other-project".into();
    let token = sign(&claims, Some(TEST_KID));

    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::Jwt(_)), "{err}");
}

#[tokio::test]
async fn wrong_issuer_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let mut claims = id_token_claims(PROJECT, "user-42");
    claims["iss"] = "https://accounts.google.com".into();
    let token = sign(&claims, Some(TEST_KID));

    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::Jwt(_)), "{err}");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let mut claims = id_token_claims(PROJECT, "user-42");
    claims["iat"] = (now() - 7_200).into();
    claims["exp"] = (now() - 3_600).into();
    let token = sign(&claims, Some(TEST_KID));

    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::Jwt(_)), "{err}");
}

#[tokio::test]
async fn missing_auth_time_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let mut claims = id_token_claims(PROJECT, "user-42");
    claims.as_object_mut().unwrap().remove("auth_time");
    let token = sign(&claims, Some(TEST_KID));

    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(
        err,
        VerifyError::InvalidClaim {
            claim: "auth_time",
            ..
        }
    ));
}

#[tokio::test]
async fn unknown_kid_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let token = sign(&id_token_claims(PROJECT, "user-42"), Some("rotated-away"));
    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::UnknownKeyId(kid) if kid == "rotated-away"));
}

#[tokio::test]
async fn token_without_kid_is_rejected_before_key_fetch() {
    let server = MockServer::start().await;
    mount_jwks(&server, 0).await;

    let token = sign(&id_token_claims(PROJECT, "user-42"), None);
    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(err, VerifyError::MissingKeyId));
}

#[tokio::test]
async fn garbage_token_is_rejected_before_key_fetch() {
    let server = MockServer::start().await;
    mount_jwks(&server, 0).await;

    for token in ["not-a-jwt", "a.b.c", ""] {
        let err = verifier(&server).verify_id_token(token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Jwt(_)), "{token}: {err}");
    }
}

#[tokio::test]
async fn key_endpoint_failure_is_a_verification_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let token = sign(&id_token_claims(PROJECT, "user-42"), Some(TEST_KID));
    let err = verifier(&server).verify_id_token(&token).await.unwrap_err();
    assert!(matches!(
        err,
        VerifyError::KeyFetch(KeyFetchError::Status { status: 500, .. })
    ));
}

// -- End to end through the router --------------------------------------------

#[tokio::test]
async fn post_root_with_real_verifier() {
    let server = MockServer::start().await;
    mount_jwks(&server, 1).await;

    let app = build_router(AppState::new(verifier(&server), ProjectId::new(PROJECT)));

    let good = sign(&id_token_claims(PROJECT, "user-42"), Some(TEST_KID));
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {good}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_string(response)
            .await
            .contains("Successfully authentication for user-42 at ")
    );

    let mut claims = id_token_claims(PROJECT, "user-42");
    claims["aud"] = "someone-else".into();
    let forged = sign(&claims, Some(TEST_KID));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {forged}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "");
}
