use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::ports::{
    comments::CommentsRepository,
    dataset::DatasetWriter,
    reviews::ReviewsRepository,
    taxonomy::{CategoriesRepository, GenresRepository},
    titles::TitlesRepository,
    users::UsersRepository,
};
#[cfg(feature = "database")]
use crate::database::postgres::{
    PostgresCommentsRepository, PostgresDatabase, PostgresDatasetWriter,
    PostgresReviewsRepository, PostgresTaxonomyRepository, PostgresTitlesRepository,
    PostgresUsersRepository,
};

/// Aggregates all repository ports used by application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub users: Arc<dyn UsersRepository>,
    pub categories: Arc<CategoriesRepository>,
    pub genres: Arc<GenresRepository>,
    pub titles: Arc<dyn TitlesRepository>,
    pub reviews: Arc<dyn ReviewsRepository>,
    pub comments: Arc<dyn CommentsRepository>,
    pub dataset: Arc<dyn DatasetWriter>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("categories", &type_name_of_val(self.categories.as_ref()))
            .field("genres", &type_name_of_val(self.genres.as_ref()))
            .field("titles", &type_name_of_val(self.titles.as_ref()))
            .field("reviews", &type_name_of_val(self.reviews.as_ref()))
            .field("comments", &type_name_of_val(self.comments.as_ref()))
            .field("dataset", &type_name_of_val(self.dataset.as_ref()))
            .finish()
    }
}

#[derive(Default)]
pub struct AppUnitOfWorkBuilder {
    users: Option<Arc<dyn UsersRepository>>,
    categories: Option<Arc<CategoriesRepository>>,
    genres: Option<Arc<GenresRepository>>,
    titles: Option<Arc<dyn TitlesRepository>>,
    reviews: Option<Arc<dyn ReviewsRepository>>,
    comments: Option<Arc<dyn CommentsRepository>>,
    dataset: Option<Arc<dyn DatasetWriter>>,
}

impl fmt::Debug for AppUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWorkBuilder")
            .field("users", &self.users.is_some())
            .field("categories", &self.categories.is_some())
            .field("genres", &self.genres.is_some())
            .field("titles", &self.titles.is_some())
            .field("reviews", &self.reviews.is_some())
            .field("comments", &self.comments.is_some())
            .field("dataset", &self.dataset.is_some())
            .finish()
    }
}

impl AppUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, repo: Arc<dyn UsersRepository>) -> Self {
        self.users = Some(repo);
        self
    }
    pub fn with_categories(mut self, repo: Arc<CategoriesRepository>) -> Self {
        self.categories = Some(repo);
        self
    }
    pub fn with_genres(mut self, repo: Arc<GenresRepository>) -> Self {
        self.genres = Some(repo);
        self
    }
    pub fn with_titles(mut self, repo: Arc<dyn TitlesRepository>) -> Self {
        self.titles = Some(repo);
        self
    }
    pub fn with_reviews(mut self, repo: Arc<dyn ReviewsRepository>) -> Self {
        self.reviews = Some(repo);
        self
    }
    pub fn with_comments(mut self, repo: Arc<dyn CommentsRepository>) -> Self {
        self.comments = Some(repo);
        self
    }
    pub fn with_dataset(mut self, repo: Arc<dyn DatasetWriter>) -> Self {
        self.dataset = Some(repo);
        self
    }

    /// Build a validated AppUnitOfWork. Returns a string error if any required
    /// repository is missing.
    pub fn build(self) -> Result<AppUnitOfWork, String> {
        Ok(AppUnitOfWork {
            users: self
                .users
                .ok_or_else(|| "missing UsersRepository".to_string())?,
            categories: self
                .categories
                .ok_or_else(|| "missing CategoriesRepository".to_string())?,
            genres: self
                .genres
                .ok_or_else(|| "missing GenresRepository".to_string())?,
            titles: self
                .titles
                .ok_or_else(|| "missing TitlesRepository".to_string())?,
            reviews: self
                .reviews
                .ok_or_else(|| "missing ReviewsRepository".to_string())?,
            comments: self
                .comments
                .ok_or_else(|| "missing CommentsRepository".to_string())?,
            dataset: self
                .dataset
                .ok_or_else(|| "missing DatasetWriter".to_string())?,
        })
    }
}

#[cfg(feature = "database")]
impl AppUnitOfWork {
    /// Compose all Postgres-backed repositories into a unit of work.
    pub fn from_postgres(db: &PostgresDatabase) -> Result<Self, String> {
        AppUnitOfWorkBuilder::new().with_postgres(db).build()
    }
}

#[cfg(feature = "database")]
impl AppUnitOfWorkBuilder {
    /// Populate the builder with Postgres-backed repository adapters.
    pub fn with_postgres(mut self, db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();

        self.users = Some(Arc::new(PostgresUsersRepository::new(pool.clone())));
        self.categories = Some(Arc::new(PostgresTaxonomyRepository::<yamdb_model::Category>::new(
            pool.clone(),
        )));
        self.genres = Some(Arc::new(PostgresTaxonomyRepository::<yamdb_model::Genre>::new(
            pool.clone(),
        )));
        self.titles = Some(Arc::new(PostgresTitlesRepository::new(pool.clone())));
        self.reviews = Some(Arc::new(PostgresReviewsRepository::new(pool.clone())));
        self.comments = Some(Arc::new(PostgresCommentsRepository::new(pool.clone())));
        self.dataset = Some(Arc::new(PostgresDatasetWriter::new(pool)));

        self
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl AppUnitOfWork {
    /// Every port backed by the same in-memory store.
    pub fn in_memory(db: Arc<crate::database::memory::MemoryDatabase>) -> Self {
        AppUnitOfWork {
            users: db.clone(),
            categories: db.clone(),
            genres: db.clone(),
            titles: db.clone(),
            reviews: db.clone(),
            comments: db.clone(),
            dataset: db,
        }
    }
}
