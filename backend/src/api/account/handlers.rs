//! Handler functions for the account API.
//!
//! These functions validate request input, hash passwords on the blocking
//! pool and call the account store. Path ids are parsed here so a malformed
//! id is rejected before the store is touched.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use bank_adapters::{Account, AccountId, AccountNumber, NewAccount, StoreError};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::service::hash_password_async;
use crate::errors::ApiError;
use crate::AppState;

/// Attempts at drawing an unused account number before giving up.
const ACCOUNT_NUMBER_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

/// Parse an account id path segment.
pub fn parse_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse::<AccountId>()
        .map_err(|_| ApiError::validation("invalid id"))
}

fn require_names(first_name: &str, last_name: &str) -> Result<(), ApiError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(ApiError::validation("first_name and last_name must not be empty"));
    }
    Ok(())
}

fn random_account_number() -> AccountNumber {
    rand::thread_rng().gen_range(1..=AccountNumber::MAX)
}

pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Json(input) = payload?;

    require_names(&input.first_name, &input.last_name)?;
    if input.password.is_empty() {
        return Err(ApiError::validation("password must not be empty"));
    }

    let password_hash = hash_password_async(input.password).await?;

    let mut attempt = 1;
    let account = loop {
        let number = random_account_number();
        let new_account = NewAccount {
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            number,
            password_hash: password_hash.clone(),
        };

        match state.store.create_account(new_account).await {
            Ok(account) => break account,
            Err(StoreError::DuplicateNumber(_)) if attempt < ACCOUNT_NUMBER_ATTEMPTS => {
                warn!(attempt, "Account number collision, drawing another");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };

    info!(event = "account.created", account_id = %account.id, "Account created");

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.store.list_accounts().await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let id = parse_id(&raw_id)?;

    state
        .store
        .get_account_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("account not found"))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(input) = payload?;
    require_names(&input.first_name, &input.last_name)?;

    let account = state
        .store
        .update_account(id, &input.first_name, &input.last_name)
        .await?;

    info!(event = "account.updated", account_id = %id, "Account updated");

    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;

    state.store.delete_account(id).await?;

    info!(event = "account.deleted", account_id = %id, "Account deleted");

    Ok(StatusCode::OK)
}
