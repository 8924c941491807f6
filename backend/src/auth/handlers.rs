//! Handler functions for authentication-related API endpoints.
//!
//! Sign-in looks the account up by its account number, verifies the password
//! on the blocking pool and issues an access token.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{info, warn};

use super::errors::CredentialError;
use super::models::{SignInRequest, SignInResponse};
use super::service::verify_password_async;
use crate::errors::ApiError;
use crate::AppState;

/// Authenticate an account holder and issue a JWT.
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>, ApiError> {
    let Json(input) = payload?;

    let account = state
        .store
        .get_account_by_number(input.account_number)
        .await?
        .ok_or_else(|| ApiError::not_found("account not found"))?;

    if let Err(err) = verify_password_async(account.password_hash.clone(), input.password).await {
        if err == CredentialError::Mismatch {
            warn!(
                event = "auth.failed",
                account_id = %account.id,
                "Sign-in rejected: invalid password"
            );
        }
        return Err(err.into());
    }

    let access_token = state.tokens.issue(&account)?;

    info!(
        event = "auth.signin",
        account_id = %account.id,
        ttl_secs = state.tokens.ttl().as_secs(),
        "Account signed in"
    );

    Ok(Json(SignInResponse { access_token }))
}
