//! General-purpose middleware for the API.
//!
//! `HttpLayers` wraps a router with the layers every route shares: a body
//! size cap, a request deadline, request tracing, and a response mapper that
//! gives errors raised outside the handlers (unknown route, wrong method) the
//! same `{"error": "..."}` body as `ApiError`.

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{header, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::errors::ApiError;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub trait HttpLayers {
    /// Applied innermost first; tracing is outermost so it sees every
    /// response, including timeouts.
    fn with_http_layers(self, request_timeout: Duration) -> Self;
}

impl<S> HttpLayers for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_http_layers(self, request_timeout: Duration) -> Self {
        self.layer(map_response(json_error_body))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(request_failed))
                    .timeout(request_timeout),
            )
            .layer(TraceLayer::new_for_http())
    }
}

async fn request_failed(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request exceeded its deadline");
        ApiError::Http(StatusCode::REQUEST_TIMEOUT)
    } else {
        ApiError::internal(err.to_string())
    }
}

/// Replace the body of an error response that is not already JSON.
async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = ApiError::Http(status).into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}
