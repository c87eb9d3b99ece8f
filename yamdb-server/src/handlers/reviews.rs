//! Reviews under a title and comments under a review.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use yamdb_model::{
    Comment, CommentId, CommentInput, Review, ReviewId, ReviewInput, TitleId,
};

use super::extract::{ApiJson, ApiPath};
use super::pagination::{Paginated, Pager};
use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;
use crate::infra::middleware::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub text: String,
    pub author: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            text: review.text,
            author: review.author,
            score: review.score,
            pub_date: review.pub_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author,
            pub_date: comment.pub_date,
        }
    }
}

pub async fn list_reviews_handler(
    State(state): State<AppState>,
    pager: Pager,
    ApiPath(title_id): ApiPath<i64>,
) -> AppResult<Json<Paginated<ReviewResponse>>> {
    let page = state
        .reviews
        .list_reviews(TitleId(title_id), pager.request())
        .await?;
    Ok(Json(pager.respond(page, ReviewResponse::from)?))
}

pub async fn get_review_handler(
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<ReviewResponse>> {
    let review = state
        .reviews
        .get_review(TitleId(title_id), ReviewId(review_id))
        .await?;
    Ok(Json(review.into()))
}

pub async fn create_review_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<i64>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> AppResult<(StatusCode, Json<ReviewResponse>)> {
    let review = state
        .reviews
        .create_review(actor.user(), TitleId(title_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

async fn update_review(
    state: AppState,
    actor: Actor,
    (title_id, review_id): (i64, i64),
    input: ReviewInput,
    partial: bool,
) -> AppResult<Json<ReviewResponse>> {
    let review = state
        .reviews
        .update_review(
            actor.user(),
            TitleId(title_id),
            ReviewId(review_id),
            input,
            partial,
        )
        .await?;
    Ok(Json(review.into()))
}

pub async fn patch_review_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(ids): ApiPath<(i64, i64)>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> AppResult<Json<ReviewResponse>> {
    update_review(state, actor, ids, input, true).await
}

pub async fn put_review_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(ids): ApiPath<(i64, i64)>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> AppResult<Json<ReviewResponse>> {
    update_review(state, actor, ids, input, false).await
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .reviews
        .delete_review(actor.user(), TitleId(title_id), ReviewId(review_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    pager: Pager,
    ApiPath((title_id, review_id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<Paginated<CommentResponse>>> {
    let page = state
        .reviews
        .list_comments(TitleId(title_id), ReviewId(review_id), pager.request())
        .await?;
    Ok(Json(pager.respond(page, CommentResponse::from)?))
}

pub async fn get_comment_handler(
    State(state): State<AppState>,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(i64, i64, i64)>,
) -> AppResult<Json<CommentResponse>> {
    let comment = state
        .reviews
        .get_comment(TitleId(title_id), ReviewId(review_id), CommentId(comment_id))
        .await?;
    Ok(Json(comment.into()))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(i64, i64)>,
    ApiJson(input): ApiJson<CommentInput>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    let comment = state
        .reviews
        .create_comment(actor.user(), TitleId(title_id), ReviewId(review_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

async fn update_comment(
    state: AppState,
    actor: Actor,
    (title_id, review_id, comment_id): (i64, i64, i64),
    input: CommentInput,
    partial: bool,
) -> AppResult<Json<CommentResponse>> {
    let comment = state
        .reviews
        .update_comment(
            actor.user(),
            TitleId(title_id),
            ReviewId(review_id),
            CommentId(comment_id),
            input,
            partial,
        )
        .await?;
    Ok(Json(comment.into()))
}

pub async fn patch_comment_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(ids): ApiPath<(i64, i64, i64)>,
    ApiJson(input): ApiJson<CommentInput>,
) -> AppResult<Json<CommentResponse>> {
    update_comment(state, actor, ids, input, true).await
}

pub async fn put_comment_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(ids): ApiPath<(i64, i64, i64)>,
    ApiJson(input): ApiJson<CommentInput>,
) -> AppResult<Json<CommentResponse>> {
    update_comment(state, actor, ids, input, false).await
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(i64, i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .reviews
        .delete_comment(
            actor.user(),
            TitleId(title_id),
            ReviewId(review_id),
            CommentId(comment_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
