use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use yamdb_model::{
    Category, CategoryId, Genre, GenreId, Page, PageRequest, Title, TitleFilter, TitleId,
};

use super::{like_pattern, page_bounds};
use crate::database::ports::titles::{TitleRecord, TitleRecordChanges, TitlesRepository};
use crate::error::Result;

const TITLE_SELECT: &str = "SELECT t.id, t.name, t.year, t.description, \
        c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
        (SELECT AVG(r.score)::float8 FROM reviews r WHERE r.title_id = t.id) AS rating \
     FROM titles t LEFT JOIN categories c ON c.id = t.category_id";

#[derive(sqlx::FromRow)]
struct TitleRow {
    id: TitleId,
    name: String,
    year: i32,
    description: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    category_slug: Option<String>,
    rating: Option<f64>,
}

impl TitleRow {
    fn into_title(self, genres: Vec<Genre>) -> Title {
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(Category { id, name, slug }),
            _ => None,
        };
        Title {
            id: self.id,
            name: self.name,
            year: self.year,
            description: self.description,
            category,
            genres,
            rating: self.rating,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GenreLinkRow {
    title_id: TitleId,
    id: GenreId,
    name: String,
    slug: String,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TitleFilter) {
    qb.push(" WHERE TRUE");
    if let Some(slug) = &filter.category {
        qb.push(" AND c.slug = ").push_bind(slug.clone());
    }
    if let Some(slug) = &filter.genre {
        qb.push(
            " AND EXISTS (SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
             WHERE tg.title_id = t.id AND g.slug = ",
        )
        .push_bind(slug.clone())
        .push(")");
    }
    if let Some(pattern) = like_pattern(filter.name.as_deref()) {
        qb.push(" AND t.name ILIKE ").push_bind(pattern);
    }
    if let Some(year) = filter.year {
        qb.push(" AND t.year = ").push_bind(year);
    }
}

#[derive(Clone, Debug)]
pub struct PostgresTitlesRepository {
    pool: PgPool,
}

impl PostgresTitlesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads genres for a batch of titles in one round trip.
    async fn genres_for(&self, ids: &[TitleId]) -> Result<HashMap<TitleId, Vec<Genre>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query_as::<_, GenreLinkRow>(
            "SELECT tg.title_id, g.id, g.name, g.slug \
             FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
             WHERE tg.title_id = ANY($1) \
             ORDER BY g.name, g.id",
        )
        .bind(raw)
        .fetch_all(&self.pool)
        .await?;

        let mut by_title: HashMap<TitleId, Vec<Genre>> = HashMap::new();
        for row in rows {
            by_title.entry(row.title_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }
        Ok(by_title)
    }

    async fn hydrate(&self, rows: Vec<TitleRow>) -> Result<Vec<Title>> {
        let ids: Vec<TitleId> = rows.iter().map(|row| row.id).collect();
        let mut genres = self.genres_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let title_genres = genres.remove(&row.id).unwrap_or_default();
                row.into_title(title_genres)
            })
            .collect())
    }

    async fn replace_genres(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: TitleId,
        genre_ids: &[GenreId],
    ) -> Result<()> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        for genre_id in genre_ids {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(*genre_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TitlesRepository for PostgresTitlesRepository {
    async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> Result<Page<Title>> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id",
        );
        push_filters(&mut count_qb, filter);
        let count = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = page_bounds(&page);
        let mut qb = QueryBuilder::<Postgres>::new(TITLE_SELECT);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY t.year DESC, t.name, t.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb
            .build_query_as::<TitleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            count: count.max(0) as u64,
            items: self.hydrate(rows).await?,
        })
    }

    async fn get_title(&self, id: TitleId) -> Result<Option<Title>> {
        let sql = format!("{TITLE_SELECT} WHERE t.id = $1");
        let Some(row) = sqlx::query_as::<_, TitleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn create_title(&self, record: &TitleRecord) -> Result<Title> {
        let mut tx = self.pool.begin().await?;
        let id: TitleId = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&record.name)
        .bind(record.year)
        .bind(&record.description)
        .bind(record.category_id)
        .fetch_one(&mut *tx)
        .await?;
        Self::replace_genres(&mut tx, id, &record.genre_ids).await?;
        tx.commit().await?;

        info!(title_id = %id, name = %record.name, "created title");
        self.get_title(id)
            .await?
            .ok_or_else(crate::error::CoreError::not_found)
    }

    async fn update_title(&self, id: TitleId, changes: &TitleRecordChanges) -> Result<Option<Title>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE titles SET \
                name = COALESCE($2, name), \
                year = COALESCE($3, year), \
                description = COALESCE($4, description), \
                category_id = COALESCE($5, category_id) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.year)
        .bind(changes.description.as_deref())
        .bind(changes.category_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        if let Some(genre_ids) = &changes.genre_ids {
            Self::replace_genres(&mut tx, id, genre_ids).await?;
        }
        tx.commit().await?;
        self.get_title(id).await
    }

    async fn delete_title(&self, id: TitleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
