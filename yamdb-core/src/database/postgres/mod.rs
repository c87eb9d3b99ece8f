//! PostgreSQL adapters for the repository ports.

mod comments;
mod dataset;
mod reviews;
mod taxonomy;
mod titles;
mod users;

pub use comments::PostgresCommentsRepository;
pub use dataset::PostgresDatasetWriter;
pub use reviews::PostgresReviewsRepository;
pub use taxonomy::PostgresTaxonomyRepository;
pub use titles::PostgresTitlesRepository;
pub use users::PostgresUsersRepository;

use std::fmt;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{CoreError, Result};

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(url)
            .await
            .map_err(|e| CoreError::Internal(format!("Database connection failed: {e}")))?;

        info!(max_connections, "database pool initialized");
        Ok(Self {
            pool,
            max_connections,
        })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        let max_connections = pool.options().get_max_connections();
        Self {
            pool,
            max_connections,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies pending migrations from `yamdb-core/migrations`.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Internal(format!("Migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Turns unique violations into field conflicts; everything else stays a
/// database error.
pub(crate) fn map_write_error(err: sqlx::Error) -> CoreError {
    if let Some(db_err) = err.as_database_error()
        && db_err.is_unique_violation()
        && let Some(conflict) = db_err.constraint().and_then(super::conflict_for)
    {
        return conflict;
    }
    CoreError::Database(err)
}

pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", super::escape_like(term)))
}

pub(crate) fn page_bounds(page: &yamdb_model::PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}
