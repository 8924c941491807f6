//! Defines the HTTP routes for account management.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use super::handlers::{create_account, delete_account, get_account, list_accounts, update_account};
use crate::auth::require_auth;
use crate::AppState;

pub fn account_router(state: AppState) -> Router<AppState> {
    let auth = || from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route(
            "/account",
            post(create_account).merge(get(list_accounts).route_layer(auth())),
        )
        .route(
            "/account/:id",
            get(get_account)
                .put(update_account)
                .delete(delete_account)
                .route_layer(auth()),
        )
}
