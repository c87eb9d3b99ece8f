use axum::{Json, extract::State};

use yamdb_core::application::accounts::{IssuedToken, SignupReceipt, SignupRequest, TokenRequest};

use super::extract::ApiJson;
use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;

/// Registers the account (or re-sends the code for an existing
/// username/email pair) and mails a confirmation code.
pub async fn signup_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> AppResult<Json<SignupReceipt>> {
    let receipt = state.accounts.signup(request).await?;
    Ok(Json(receipt))
}

pub async fn token_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> AppResult<Json<IssuedToken>> {
    let token = state.accounts.issue_token(request).await?;
    Ok(Json(token))
}
