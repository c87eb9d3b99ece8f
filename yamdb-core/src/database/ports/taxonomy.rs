use async_trait::async_trait;
use yamdb_model::{Category, CategoryId, Genre, GenreId, Page, PageRequest, Taxon};

use crate::error::Result;

/// Shared shape of categories and genres: a named, slug-addressed row.
pub trait TaxonEntity: Clone + Send + Sync + 'static {
    /// Table holding the rows.
    const TABLE: &'static str;
    /// Relation name used in error messages.
    const LABEL: &'static str;

    fn from_parts(id: i64, name: String, slug: String) -> Self;
    fn id(&self) -> i64;
    fn name(&self) -> &str;
    fn slug(&self) -> &str;
}

impl TaxonEntity for Category {
    const TABLE: &'static str = "categories";
    const LABEL: &'static str = "category";

    fn from_parts(id: i64, name: String, slug: String) -> Self {
        Category {
            id: CategoryId(id),
            name,
            slug,
        }
    }
    fn id(&self) -> i64 {
        self.id.get()
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

impl TaxonEntity for Genre {
    const TABLE: &'static str = "genres";
    const LABEL: &'static str = "genre";

    fn from_parts(id: i64, name: String, slug: String) -> Self {
        Genre {
            id: GenreId(id),
            name,
            slug,
        }
    }
    fn id(&self) -> i64 {
        self.id.get()
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

/// Category or genre storage; slugs are unique per table.
#[async_trait]
pub trait TaxonomyRepository<T: TaxonEntity>: Send + Sync {
    /// Rows ordered by name, optionally narrowed to names containing
    /// `search` (case-insensitive).
    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<T>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<T>>;
    async fn create(&self, taxon: &Taxon) -> Result<T>;
    /// Deleting a category detaches its titles; deleting a genre unlinks it.
    async fn delete_by_slug(&self, slug: &str) -> Result<bool>;
}

pub type CategoriesRepository = dyn TaxonomyRepository<Category>;
pub type GenresRepository = dyn TaxonomyRepository<Genre>;
