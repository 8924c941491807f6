//! Defines the HTTP routes specifically for authentication.
//!
//! Sign-in is public; every other route that needs an identity is guarded by
//! `require_auth` in its own router.

use axum::{routing::post, Router};

use super::handlers::sign_in;
use crate::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new().route("/signin", post(sign_in))
}
