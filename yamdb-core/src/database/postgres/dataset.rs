use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use yamdb_model::{Category, Genre};

use super::map_write_error;
use crate::database::ports::dataset::{
    CommentRow, DatasetWriter, GenreLink, ReviewRow, TitleRow, UserRow,
};
use crate::error::Result;

const SEQUENCED_TABLES: [&str; 6] = ["users", "categories", "genres", "titles", "reviews", "comments"];

#[derive(Clone, Debug)]
pub struct PostgresDatasetWriter {
    pool: PgPool,
}

impl PostgresDatasetWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_taxa(&self, table: &str, rows: &[(i64, &str, &str)]) -> Result<u64> {
        let sql = format!(
            "INSERT INTO {table} (id, name, slug) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug"
        );
        let mut tx = self.pool.begin().await?;
        for (id, name, slug) in rows {
            sqlx::query(&sql)
                .bind(id)
                .bind(name)
                .bind(slug)
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl DatasetWriter for PostgresDatasetWriter {
    async fn upsert_categories(&self, rows: &[Category]) -> Result<u64> {
        let rows: Vec<_> = rows
            .iter()
            .map(|row| (row.id.get(), row.name.as_str(), row.slug.as_str()))
            .collect();
        self.upsert_taxa("categories", &rows).await
    }

    async fn upsert_genres(&self, rows: &[Genre]) -> Result<u64> {
        let rows: Vec<_> = rows
            .iter()
            .map(|row| (row.id.get(), row.name.as_str(), row.slug.as_str()))
            .collect();
        self.upsert_taxa("genres", &rows).await
    }

    async fn upsert_users(&self, rows: &[UserRow]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO users (id, username, email, role, bio, first_name, last_name) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (id) DO UPDATE SET \
                    username = EXCLUDED.username, email = EXCLUDED.email, \
                    role = EXCLUDED.role, bio = EXCLUDED.bio, \
                    first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name",
            )
            .bind(row.id)
            .bind(&row.username)
            .bind(&row.email)
            .bind(row.role.as_str())
            .bind(&row.bio)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn upsert_titles(&self, rows: &[TitleRow]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO titles (id, name, year, category_id) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET \
                    name = EXCLUDED.name, year = EXCLUDED.year, category_id = EXCLUDED.category_id",
            )
            .bind(row.id)
            .bind(&row.name)
            .bind(row.year)
            .bind(row.category_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn link_genres(&self, rows: &[GenreLink]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(row.title_id)
            .bind(row.genre_id)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn upsert_reviews(&self, rows: &[ReviewRow]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO reviews (id, title_id, author_id, text, score, pub_date) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (id) DO UPDATE SET \
                    title_id = EXCLUDED.title_id, author_id = EXCLUDED.author_id, \
                    text = EXCLUDED.text, score = EXCLUDED.score, pub_date = EXCLUDED.pub_date",
            )
            .bind(row.id)
            .bind(row.title_id)
            .bind(row.author_id)
            .bind(&row.text)
            .bind(row.score)
            .bind(row.pub_date)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn upsert_comments(&self, rows: &[CommentRow]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO comments (id, review_id, author_id, text, pub_date) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (id) DO UPDATE SET \
                    review_id = EXCLUDED.review_id, author_id = EXCLUDED.author_id, \
                    text = EXCLUDED.text, pub_date = EXCLUDED.pub_date",
            )
            .bind(row.id)
            .bind(row.review_id)
            .bind(row.author_id)
            .bind(&row.text)
            .bind(row.pub_date)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn realign_sequences(&self) -> Result<()> {
        for table in SEQUENCED_TABLES {
            let sql = format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
                 COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        info!("id sequences realigned after import");
        Ok(())
    }
}
