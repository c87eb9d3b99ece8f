use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use yamdb_model::{Role, User, UserInput};

use super::extract::{ApiJson, ApiPath, ApiQuery, SearchQuery};
use super::pagination::{Paginated, Pager};
use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;
use crate::infra::middleware::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    actor: Actor,
    pager: Pager,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state
        .accounts
        .list_users(actor.user(), query.term(), pager.request())
        .await?;
    Ok(Json(pager.respond(page, UserResponse::from)?))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<UserInput>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.accounts.create_user(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.accounts.get_user(actor.user(), &username).await?;
    Ok(Json(user.into()))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
    ApiJson(input): ApiJson<UserInput>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .accounts
        .update_user(actor.user(), &username, input)
        .await?;
    Ok(Json(user.into()))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> AppResult<StatusCode> {
    state.accounts.delete_user(actor.user(), &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<UserResponse>> {
    let user = state.accounts.me(actor.user())?;
    Ok(Json(user.into()))
}

/// Profile edit for the caller; `role` in the body is ignored.
pub async fn update_me_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<UserInput>,
) -> AppResult<Json<UserResponse>> {
    let user = state.accounts.update_me(actor.user(), input).await?;
    Ok(Json(user.into()))
}
