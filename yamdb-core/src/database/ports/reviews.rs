use async_trait::async_trait;
use yamdb_model::{NewReview, Page, PageRequest, Review, ReviewChanges, ReviewId, TitleId, UserId};

use crate::error::Result;

#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    /// Reviews of one title, newest first.
    async fn list_reviews(&self, title_id: TitleId, page: PageRequest) -> Result<Page<Review>>;
    /// A review only resolves under the title it belongs to.
    async fn get_review(&self, title_id: TitleId, review_id: ReviewId) -> Result<Option<Review>>;
    async fn review_exists(&self, title_id: TitleId, author_id: UserId) -> Result<bool>;
    /// Fails with a conflict when the author already reviewed the title.
    async fn create_review(&self, review: &NewReview) -> Result<Review>;
    async fn update_review(&self, id: ReviewId, changes: &ReviewChanges) -> Result<Option<Review>>;
    async fn delete_review(&self, id: ReviewId) -> Result<bool>;
}
