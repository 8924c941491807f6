//! Handler for the balance transfer endpoint.
//!
//! The caller's identity comes from `require_auth`; it is recorded with the
//! transfer but does not restrict which accounts may be debited.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};

use crate::auth::AuthenticatedAccount;
use crate::errors::ApiError;
use crate::services::TransferIntent;
use crate::AppState;

pub async fn transfer(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    payload: Result<Json<TransferIntent>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(intent) = payload?;

    state.transfers.transfer(intent, caller.id).await?;

    Ok(StatusCode::OK)
}
