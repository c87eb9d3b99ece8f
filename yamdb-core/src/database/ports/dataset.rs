//! Bulk writes with caller-supplied ids, used by the CSV importer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use yamdb_model::{
    Category, CategoryId, CommentId, Genre, GenreId, ReviewId, Role, TitleId, UserId,
};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRow {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreLink {
    pub title_id: TitleId,
    pub genre_id: GenreId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub title_id: TitleId,
    pub author_id: UserId,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub author_id: UserId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

/// Rows are upserted by id so an import can be re-run over the same files.
#[async_trait]
pub trait DatasetWriter: Send + Sync {
    async fn upsert_categories(&self, rows: &[Category]) -> Result<u64>;
    async fn upsert_genres(&self, rows: &[Genre]) -> Result<u64>;
    async fn upsert_users(&self, rows: &[UserRow]) -> Result<u64>;
    async fn upsert_titles(&self, rows: &[TitleRow]) -> Result<u64>;
    async fn link_genres(&self, rows: &[GenreLink]) -> Result<u64>;
    async fn upsert_reviews(&self, rows: &[ReviewRow]) -> Result<u64>;
    async fn upsert_comments(&self, rows: &[CommentRow]) -> Result<u64>;
    /// Moves id generators past the highest imported id.
    async fn realign_sequences(&self) -> Result<()>;
}
