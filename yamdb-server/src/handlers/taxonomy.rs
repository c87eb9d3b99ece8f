//! Categories and genres share one shape: `{name, slug}` addressed by slug.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use yamdb_model::{Category, Genre, TaxonInput};

use super::extract::{ApiJson, ApiPath, ApiQuery, SearchQuery};
use super::pagination::{Paginated, Pager};
use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;
use crate::infra::middleware::Actor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonResponse {
    pub name: String,
    pub slug: String,
}

impl From<Category> for TaxonResponse {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            slug: category.slug,
        }
    }
}

impl From<Genre> for TaxonResponse {
    fn from(genre: Genre) -> Self {
        Self {
            name: genre.name,
            slug: genre.slug,
        }
    }
}

pub async fn list_categories_handler(
    State(state): State<AppState>,
    pager: Pager,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Paginated<TaxonResponse>>> {
    let page = state
        .catalog
        .list_categories(query.term(), pager.request())
        .await?;
    Ok(Json(pager.respond(page, TaxonResponse::from)?))
}

pub async fn create_category_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<TaxonInput>,
) -> AppResult<(StatusCode, Json<TaxonResponse>)> {
    let category = state.catalog.create_category(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn delete_category_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<StatusCode> {
    state.catalog.delete_category(actor.user(), &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_genres_handler(
    State(state): State<AppState>,
    pager: Pager,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Paginated<TaxonResponse>>> {
    let page = state
        .catalog
        .list_genres(query.term(), pager.request())
        .await?;
    Ok(Json(pager.respond(page, TaxonResponse::from)?))
}

pub async fn create_genre_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<TaxonInput>,
) -> AppResult<(StatusCode, Json<TaxonResponse>)> {
    let genre = state.catalog.create_genre(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(genre.into())))
}

pub async fn delete_genre_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<StatusCode> {
    state.catalog.delete_genre(actor.user(), &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
