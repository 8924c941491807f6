//! Banking backend library.
//!
//! Exposes the application state and the fully layered Axum router so the
//! binary and the integration tests build the exact same service.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use bank_adapters::AccountStore;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::middleware::HttpLayers;
use crate::services::transfer::{TransferPolicy, TransferService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub tokens: Arc<TokenService>,
    pub transfers: Arc<TransferService>,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, config: &AppConfig) -> Self {
        let policy = TransferPolicy {
            overdraft_limit: config.overdraft_limit,
            store_timeout: config.store_timeout,
        };

        Self {
            tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl)),
            transfers: Arc::new(TransferService::new(store.clone(), policy)),
            store,
        }
    }
}

/// Build the complete router: public and protected routes plus HTTP layers.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::auth_router())
        .merge(api::account::account_router(state.clone()))
        .merge(api::transfer::transfer_router(state.clone()))
        .with_state(state)
        .with_http_layers(request_timeout)
}

async fn health() -> &'static str {
    "OK"
}
