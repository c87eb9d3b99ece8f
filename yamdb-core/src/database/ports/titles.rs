use async_trait::async_trait;
use yamdb_model::{CategoryId, GenreId, Page, PageRequest, Title, TitleFilter, TitleId};

use crate::error::Result;

/// Title write with relations resolved to ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRecord {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: CategoryId,
    pub genre_ids: Vec<GenreId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleRecordChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Replaces the whole genre set when present.
    pub genre_ids: Option<Vec<GenreId>>,
}

/// Every read returns the title with category, genres and rating filled in.
#[async_trait]
pub trait TitlesRepository: Send + Sync {
    /// Matching titles, newest year first, then by name.
    async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> Result<Page<Title>>;
    async fn get_title(&self, id: TitleId) -> Result<Option<Title>>;
    async fn create_title(&self, record: &TitleRecord) -> Result<Title>;
    async fn update_title(&self, id: TitleId, changes: &TitleRecordChanges) -> Result<Option<Title>>;
    /// Removes the title and, through cascades, its reviews and comments.
    async fn delete_title(&self, id: TitleId) -> Result<bool>;
}
