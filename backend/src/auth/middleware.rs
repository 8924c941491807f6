//! Middleware for protecting authenticated routes.
//!
//! `require_auth` extracts the bearer token, validates it with the
//! `TokenService` and makes the resolved account available to the wrapped
//! handler. A request that fails any step never reaches the handler.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use super::errors::AuthError;
use super::models::AuthenticatedAccount;
use crate::errors::ApiError;
use crate::AppState;

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).inspect_err(|err| {
        warn!(event = "auth.rejected", reason = %err, path = %request.uri().path(), "Missing or malformed credentials");
    })?;

    let account_id = state.tokens.validate(token).inspect_err(|err| {
        warn!(event = "auth.rejected", reason = %err, "Token rejected");
    })?;

    info!(event = "auth.success", account_id = %account_id, "Request authenticated");

    request
        .extensions_mut()
        .insert(AuthenticatedAccount { id: account_id });

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The value must be exactly two whitespace-separated parts.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn test_well_formed_header() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer   abc")), Ok("abc"));
    }

    #[test]
    fn test_malformed_headers() {
        for value in ["", "Bearer", "Bearer ", "abc.def.ghi", "Basic abc", "Bearer a b"] {
            assert_eq!(
                bearer_token(&headers(value)),
                Err(AuthError::MalformedHeader),
                "header value {:?}",
                value
            );
        }
    }
}
