use async_trait::async_trait;
use yamdb_model::{Comment, CommentChanges, CommentId, NewComment, Page, PageRequest, ReviewId};

use crate::error::Result;

#[async_trait]
pub trait CommentsRepository: Send + Sync {
    /// Comments on one review, newest first.
    async fn list_comments(&self, review_id: ReviewId, page: PageRequest) -> Result<Page<Comment>>;
    async fn get_comment(&self, review_id: ReviewId, comment_id: CommentId) -> Result<Option<Comment>>;
    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;
    async fn update_comment(&self, id: CommentId, changes: &CommentChanges) -> Result<Option<Comment>>;
    async fn delete_comment(&self, id: CommentId) -> Result<bool>;
}
