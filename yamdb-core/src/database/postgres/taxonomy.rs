use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use yamdb_model::{Page, PageRequest, Taxon};

use super::{like_pattern, map_write_error, page_bounds};
use crate::database::ports::taxonomy::{TaxonEntity, TaxonomyRepository};
use crate::error::Result;

#[derive(sqlx::FromRow)]
struct TaxonRow {
    id: i64,
    name: String,
    slug: String,
}

impl TaxonRow {
    fn into_entity<T: TaxonEntity>(self) -> T {
        T::from_parts(self.id, self.name, self.slug)
    }
}

/// One adapter serves both `categories` and `genres`; the table comes from
/// the entity type.
#[derive(Debug)]
pub struct PostgresTaxonomyRepository<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for PostgresTaxonomyRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: TaxonEntity> PostgresTaxonomyRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: TaxonEntity> TaxonomyRepository<T> for PostgresTaxonomyRepository<T> {
    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<T>> {
        let pattern = like_pattern(search);
        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE ($1::text IS NULL OR name ILIKE $1)",
            T::TABLE
        );
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = page_bounds(&page);
        let sql = format!(
            "SELECT id, name, slug FROM {} \
             WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY name, id LIMIT $2 OFFSET $3",
            T::TABLE
        );
        let rows = sqlx::query_as::<_, TaxonRow>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            count: count.max(0) as u64,
            items: rows.into_iter().map(TaxonRow::into_entity).collect(),
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<T>> {
        let sql = format!("SELECT id, name, slug FROM {} WHERE slug = $1", T::TABLE);
        let row = sqlx::query_as::<_, TaxonRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TaxonRow::into_entity))
    }

    async fn create(&self, taxon: &Taxon) -> Result<T> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            T::TABLE
        );
        let row = sqlx::query_as::<_, TaxonRow>(&sql)
            .bind(&taxon.name)
            .bind(&taxon.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into_entity())
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE slug = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(slug).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
