use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::auth::RequestHeaders;

/// Handler で、リクエストヘッダを `RequestHeaders` として受け取るための extractor
/// 失敗しない (認証の判定は authenticator 側)
impl<S> FromRequestParts<S> for RequestHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestHeaders::from_header_map(&parts.headers))
    }
}
