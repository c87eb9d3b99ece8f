//! Reviews of titles and the comments under them.
//!
//! Every route is nested under a title (and, for comments, a review), so each
//! operation first resolves its parents and answers 404 when any of them is
//! missing. Reading is open; writing needs an account, and changing someone
//! else's text needs a moderator or administrator.

use std::sync::Arc;

use tracing::info;
use yamdb_model::{
    Comment, CommentChanges, CommentId, CommentInput, Page, PageRequest, Review, ReviewChanges,
    ReviewId, ReviewInput, TitleId, User, ValidationErrors,
};

use super::unit_of_work::AppUnitOfWork;
use crate::auth::{Access, AccessPolicy, Denied};
use crate::database::DUPLICATE_REVIEW;
use crate::database::ports::comments::CommentsRepository;
use crate::database::ports::reviews::ReviewsRepository;
use crate::database::ports::titles::TitlesRepository;
use crate::error::{CoreError, Result};

const POLICY: AccessPolicy = AccessPolicy::AuthorStaffOrReadOnly;

#[derive(Clone)]
pub struct ReviewService {
    titles: Arc<dyn TitlesRepository>,
    reviews: Arc<dyn ReviewsRepository>,
    comments: Arc<dyn CommentsRepository>,
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService").finish_non_exhaustive()
    }
}

impl ReviewService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            titles: uow.titles.clone(),
            reviews: uow.reviews.clone(),
            comments: uow.comments.clone(),
        }
    }

    pub async fn list_reviews(&self, title_id: TitleId, page: PageRequest) -> Result<Page<Review>> {
        self.ensure_title(title_id).await?;
        self.reviews.list_reviews(title_id, page).await
    }

    pub async fn get_review(&self, title_id: TitleId, review_id: ReviewId) -> Result<Review> {
        self.ensure_title(title_id).await?;
        self.find_review(title_id, review_id).await
    }

    pub async fn create_review(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        input: ReviewInput,
    ) -> Result<Review> {
        POLICY.check_request(actor, Access::Write)?;
        let author = actor.ok_or(Denied::Unauthenticated)?;
        self.ensure_title(title_id).await?;

        let new_review = input.into_new_review(title_id, author.id)?;
        if self.reviews.review_exists(title_id, author.id).await? {
            return Err(ValidationErrors::non_field(DUPLICATE_REVIEW).into());
        }
        let review = self.reviews.create_review(&new_review).await?;
        info!(
            review_id = %review.id,
            title_id = %title_id,
            author = %author.username,
            score = review.score,
            "review created"
        );
        Ok(review)
    }

    /// `partial` selects PATCH semantics; a full update needs text and score.
    pub async fn update_review(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        input: ReviewInput,
        partial: bool,
    ) -> Result<Review> {
        POLICY.check_request(actor, Access::Write)?;
        self.ensure_title(title_id).await?;
        let review = self.find_review(title_id, review_id).await?;
        POLICY.check_object(actor, Access::Write, review.author_id)?;

        let changes = if partial {
            input.into_changes()?
        } else {
            let full = input.into_new_review(title_id, review.author_id)?;
            ReviewChanges {
                text: Some(full.text),
                score: Some(full.score),
            }
        };
        self.reviews
            .update_review(review.id, &changes)
            .await?
            .ok_or_else(CoreError::not_found)
    }

    pub async fn delete_review(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<()> {
        POLICY.check_request(actor, Access::Write)?;
        self.ensure_title(title_id).await?;
        let review = self.find_review(title_id, review_id).await?;
        POLICY.check_object(actor, Access::Write, review.author_id)?;

        if !self.reviews.delete_review(review.id).await? {
            return Err(CoreError::not_found());
        }
        info!(review_id = %review.id, title_id = %title_id, "review deleted");
        Ok(())
    }

    pub async fn list_comments(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        let review = self.get_review(title_id, review_id).await?;
        self.comments.list_comments(review.id, page).await
    }

    pub async fn get_comment(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<Comment> {
        let review = self.get_review(title_id, review_id).await?;
        self.find_comment(review.id, comment_id).await
    }

    pub async fn create_comment(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        input: CommentInput,
    ) -> Result<Comment> {
        POLICY.check_request(actor, Access::Write)?;
        let author = actor.ok_or(Denied::Unauthenticated)?;
        let review = self.get_review(title_id, review_id).await?;

        let new_comment = input.into_new_comment(review.id, author.id)?;
        let comment = self.comments.create_comment(&new_comment).await?;
        info!(
            comment_id = %comment.id,
            review_id = %review.id,
            author = %author.username,
            "comment created"
        );
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
        input: CommentInput,
        partial: bool,
    ) -> Result<Comment> {
        POLICY.check_request(actor, Access::Write)?;
        let review = self.get_review(title_id, review_id).await?;
        let comment = self.find_comment(review.id, comment_id).await?;
        POLICY.check_object(actor, Access::Write, comment.author_id)?;

        let changes = if partial {
            input.into_changes()?
        } else {
            let full = input.into_new_comment(review.id, comment.author_id)?;
            CommentChanges {
                text: Some(full.text),
            }
        };
        self.comments
            .update_comment(comment.id, &changes)
            .await?
            .ok_or_else(CoreError::not_found)
    }

    pub async fn delete_comment(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<()> {
        POLICY.check_request(actor, Access::Write)?;
        let review = self.get_review(title_id, review_id).await?;
        let comment = self.find_comment(review.id, comment_id).await?;
        POLICY.check_object(actor, Access::Write, comment.author_id)?;

        if !self.comments.delete_comment(comment.id).await? {
            return Err(CoreError::not_found());
        }
        info!(comment_id = %comment.id, review_id = %review.id, "comment deleted");
        Ok(())
    }

    async fn ensure_title(&self, title_id: TitleId) -> Result<()> {
        match self.titles.get_title(title_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found()),
        }
    }

    async fn find_review(&self, title_id: TitleId, review_id: ReviewId) -> Result<Review> {
        self.reviews
            .get_review(title_id, review_id)
            .await?
            .ok_or_else(CoreError::not_found)
    }

    async fn find_comment(&self, review_id: ReviewId, comment_id: CommentId) -> Result<Comment> {
        self.comments
            .get_comment(review_id, comment_id)
            .await?
            .ok_or_else(CoreError::not_found)
    }
}
