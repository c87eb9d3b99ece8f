use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use yamdb_model::{Title, TitleFilter, TitleId, TitleInput, ValidationErrors};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::pagination::{Paginated, Pager};
use super::taxonomy::TaxonResponse;
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};
use crate::infra::middleware::Actor;

/// Read representation: relations embedded, rating as a whole number.
#[derive(Debug, Clone, Serialize)]
pub struct TitleResponse {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub rating: Option<i64>,
    pub description: String,
    pub genre: Vec<TaxonResponse>,
    pub category: Option<TaxonResponse>,
}

impl From<Title> for TitleResponse {
    fn from(title: Title) -> Self {
        let rating = title.rating_score();
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            rating,
            description: title.description,
            genre: title.genres.into_iter().map(TaxonResponse::from).collect(),
            category: title.category.map(TaxonResponse::from),
        }
    }
}

/// Write representation: relations echoed back as slugs.
#[derive(Debug, Clone, Serialize)]
pub struct TitleWriteResponse {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub genre: Vec<String>,
    pub category: Option<String>,
}

impl From<Title> for TitleWriteResponse {
    fn from(title: Title) -> Self {
        Self {
            id: title.id,
            genre: title.genre_slugs().into_iter().map(str::to_string).collect(),
            category: title.category_slug().map(str::to_string),
            name: title.name,
            year: title.year,
            description: title.description,
        }
    }
}

/// Raw filter parameters; `year` is parsed by hand to report a field error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleQuery {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<String>,
}

impl TryFrom<TitleQuery> for TitleFilter {
    type Error = ValidationErrors;

    fn try_from(query: TitleQuery) -> Result<Self, Self::Error> {
        let year = match query.year.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| ValidationErrors::single("year", "Enter a number."))?,
            ),
        };
        Ok(TitleFilter {
            category: non_empty(query.category),
            genre: non_empty(query.genre),
            name: non_empty(query.name),
            year,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub async fn list_titles_handler(
    State(state): State<AppState>,
    pager: Pager,
    ApiQuery(query): ApiQuery<TitleQuery>,
) -> AppResult<Json<Paginated<TitleResponse>>> {
    let filter = TitleFilter::try_from(query).map_err(AppError::validation)?;
    let page = state.catalog.list_titles(&filter, pager.request()).await?;
    Ok(Json(pager.respond(page, TitleResponse::from)?))
}

pub async fn get_title_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<TitleResponse>> {
    let title = state.catalog.get_title(TitleId(id)).await?;
    Ok(Json(title.into()))
}

pub async fn create_title_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<TitleInput>,
) -> AppResult<(StatusCode, Json<TitleWriteResponse>)> {
    let title = state.catalog.create_title(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(title.into())))
}

pub async fn patch_title_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TitleInput>,
) -> AppResult<Json<TitleWriteResponse>> {
    let title = state
        .catalog
        .update_title(actor.user(), TitleId(id), input, true)
        .await?;
    Ok(Json(title.into()))
}

pub async fn put_title_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TitleInput>,
) -> AppResult<Json<TitleWriteResponse>> {
    let title = state
        .catalog
        .update_title(actor.user(), TitleId(id), input, false)
        .await?;
    Ok(Json(title.into()))
}

pub async fn delete_title_handler(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    state.catalog.delete_title(actor.user(), TitleId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
