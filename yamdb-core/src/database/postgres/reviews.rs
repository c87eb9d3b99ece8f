use async_trait::async_trait;
use sqlx::PgPool;
use yamdb_model::{
    NewReview, Page, PageRequest, Review, ReviewChanges, ReviewId, TitleId, UserId,
};

use super::{map_write_error, page_bounds};
use crate::database::ports::reviews::ReviewsRepository;
use crate::error::{CoreError, Result};

const REVIEW_SELECT: &str = "SELECT r.id, r.title_id, r.author_id, u.username AS author, \
        r.text, r.score, r.pub_date \
     FROM reviews r JOIN users u ON u.id = r.author_id";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    title_id: TitleId,
    author_id: UserId,
    author: String,
    text: String,
    score: i32,
    pub_date: chrono::DateTime<chrono::Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            title_id: row.title_id,
            author_id: row.author_id,
            author: row.author,
            text: row.text,
            score: row.score,
            pub_date: row.pub_date,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostgresReviewsRepository {
    pool: PgPool,
}

impl PostgresReviewsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn by_id(&self, id: ReviewId) -> Result<Option<Review>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl ReviewsRepository for PostgresReviewsRepository {
    async fn list_reviews(&self, title_id: TitleId, page: PageRequest) -> Result<Page<Review>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = page_bounds(&page);
        let sql = format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 \
             ORDER BY r.pub_date DESC, r.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(title_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            count: count.max(0) as u64,
            items: rows.into_iter().map(Into::into).collect(),
        })
    }

    async fn get_review(&self, title_id: TitleId, review_id: ReviewId) -> Result<Option<Review>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1 AND r.title_id = $2");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn review_exists(&self, title_id: TitleId, author_id: UserId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review> {
        let id: ReviewId = sqlx::query_scalar(
            "INSERT INTO reviews (title_id, author_id, text, score) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(review.title_id)
        .bind(review.author_id)
        .bind(&review.text)
        .bind(review.score)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        self.by_id(id).await?.ok_or_else(CoreError::not_found)
    }

    async fn update_review(&self, id: ReviewId, changes: &ReviewChanges) -> Result<Option<Review>> {
        let updated = sqlx::query(
            "UPDATE reviews SET text = COALESCE($2, text), score = COALESCE($3, score) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.text.as_deref())
        .bind(changes.score)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.by_id(id).await
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
