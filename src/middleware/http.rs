//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Per-request tracing span with request id and the fully qualified Cloud Trace
//!   resource (`projects/<project>/traces/<id>`) for log correlation
//! - Body size limits
//! - Global timeouts

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Request, StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::logging::TRACE_FIELD;
use crate::services::project_id::ProjectId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const CLOUD_TRACE_HEADER: &str = "x-cloud-trace-context";

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults:
/// - Request-Id header: `x-request-id`
/// - Body limit: 1 MiB
/// - Timeout: 30 seconds
pub fn apply(router: Router, project_id: ProjectId) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        // Span per request; sits outside the body limit so it sees the plain `Body`.
        .layer(TraceLayer::new_for_http().make_span_with(move |req: &Request<Body>| {
            make_request_span(req, &project_id)
        }))
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    router.layer(layers)
}

fn make_request_span(req: &Request<Body>, project_id: &ProjectId) -> Span {
    let headers = req.headers();

    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let span = tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id,
        "logging.googleapis.com/trace" = tracing::field::Empty,
    );

    // header が無いリクエストには trace キーを出さない
    if let Some(trace) = headers
        .get(CLOUD_TRACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| cloud_trace_resource(project_id, v))
    {
        span.record(TRACE_FIELD, trace.as_str());
    }

    span
}

/// `X-Cloud-Trace-Context` value → `projects/<project>/traces/<TRACE_ID>`
fn cloud_trace_resource(project_id: &ProjectId, header_value: &str) -> Option<String> {
    cloud_trace_id(header_value).map(|trace| format!("projects/{project_id}/traces/{trace}"))
}

/// `TRACE_ID/SPAN_ID;o=OPTIONS` → `TRACE_ID`
fn cloud_trace_id(value: &str) -> Option<&str> {
    let trace = value.split(['/', ';']).next()?.trim();
    (!trace.is_empty()).then_some(trace)
}
