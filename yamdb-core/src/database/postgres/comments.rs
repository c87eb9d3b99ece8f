use async_trait::async_trait;
use sqlx::PgPool;
use yamdb_model::{
    Comment, CommentChanges, CommentId, NewComment, Page, PageRequest, ReviewId, UserId,
};

use super::page_bounds;
use crate::database::ports::comments::CommentsRepository;
use crate::error::{CoreError, Result};

const COMMENT_SELECT: &str = "SELECT cm.id, cm.review_id, cm.author_id, u.username AS author, \
        cm.text, cm.pub_date \
     FROM comments cm JOIN users u ON u.id = cm.author_id";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    review_id: ReviewId,
    author_id: UserId,
    author: String,
    text: String,
    pub_date: chrono::DateTime<chrono::Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            review_id: row.review_id,
            author_id: row.author_id,
            author: row.author,
            text: row.text,
            pub_date: row.pub_date,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostgresCommentsRepository {
    pool: PgPool,
}

impl PostgresCommentsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn by_id(&self, id: CommentId) -> Result<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE cm.id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl CommentsRepository for PostgresCommentsRepository {
    async fn list_comments(&self, review_id: ReviewId, page: PageRequest) -> Result<Page<Comment>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = page_bounds(&page);
        let sql = format!(
            "{COMMENT_SELECT} WHERE cm.review_id = $1 \
             ORDER BY cm.pub_date DESC, cm.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(review_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            count: count.max(0) as u64,
            items: rows.into_iter().map(Into::into).collect(),
        })
    }

    async fn get_comment(&self, review_id: ReviewId, comment_id: CommentId) -> Result<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE cm.id = $1 AND cm.review_id = $2");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment_id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let id: CommentId = sqlx::query_scalar(
            "INSERT INTO comments (review_id, author_id, text) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(comment.review_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await?;

        self.by_id(id).await?.ok_or_else(CoreError::not_found)
    }

    async fn update_comment(&self, id: CommentId, changes: &CommentChanges) -> Result<Option<Comment>> {
        let updated = sqlx::query("UPDATE comments SET text = COALESCE($2, text) WHERE id = $1")
            .bind(id)
            .bind(changes.text.as_deref())
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.by_id(id).await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
