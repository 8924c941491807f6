//! Defines the HTTP route for balance transfers.
//!
//! `PATCH /transfer` is guarded by `require_auth`; the handler receives the
//! caller's identity through request extensions.

use axum::{middleware::from_fn_with_state, routing::patch, Router};

use super::handlers::transfer;
use crate::auth::require_auth;
use crate::AppState;

pub fn transfer_router(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/transfer",
        patch(transfer).route_layer(from_fn_with_state(state, require_auth)),
    )
}
