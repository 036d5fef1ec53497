use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use url::form_urlencoded;

/// Request parameters of `POST /`: query string plus an urlencoded form body.
///
/// Any other body is accepted and ignored. Later keys overwrite earlier ones,
/// and form fields overwrite query fields.
#[derive(Debug, Default)]
pub struct LoginParams(pub HashMap<String, String>);

impl<S> FromRequest<S> for LoginParams
where
    S: Send + Sync,
{
    type Rejection = BytesRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = HashMap::new();

        if let Some(query) = req.uri().query() {
            params.extend(form_urlencoded::parse(query.as_bytes()).into_owned());
        }

        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let body = Bytes::from_request(req, state).await?;
        if is_form {
            params.extend(form_urlencoded::parse(&body).into_owned());
        }

        Ok(Self(params))
    }
}
