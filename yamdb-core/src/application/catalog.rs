//! Categories, genres and titles.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::info;
use yamdb_model::{
    Category, Genre, GenreId, NewTitle, Page, PageRequest, TaxonInput, Title, TitleChanges,
    TitleFilter, TitleId, TitleInput, User, ValidationErrors,
};

use super::unit_of_work::AppUnitOfWork;
use crate::auth::{Access, AccessPolicy};
use crate::database::ports::taxonomy::{TaxonEntity, TaxonomyRepository};
use crate::database::ports::titles::{TitleRecord, TitleRecordChanges, TitlesRepository};
use crate::error::{CoreError, Result};

const POLICY: AccessPolicy = AccessPolicy::AdminOrReadOnly;

fn missing_slug(slug: &str) -> String {
    format!("Object with slug={slug} does not exist.")
}

#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<dyn TaxonomyRepository<Category>>,
    genres: Arc<dyn TaxonomyRepository<Genre>>,
    titles: Arc<dyn TitlesRepository>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            categories: uow.categories.clone(),
            genres: uow.genres.clone(),
            titles: uow.titles.clone(),
        }
    }

    pub async fn list_categories(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Category>> {
        self.categories.list(search, page).await
    }

    pub async fn create_category(&self, actor: Option<&User>, input: TaxonInput) -> Result<Category> {
        create_taxon(self.categories.as_ref(), actor, input).await
    }

    pub async fn delete_category(&self, actor: Option<&User>, slug: &str) -> Result<()> {
        delete_taxon(self.categories.as_ref(), actor, slug).await
    }

    pub async fn list_genres(&self, search: Option<&str>, page: PageRequest) -> Result<Page<Genre>> {
        self.genres.list(search, page).await
    }

    pub async fn create_genre(&self, actor: Option<&User>, input: TaxonInput) -> Result<Genre> {
        create_taxon(self.genres.as_ref(), actor, input).await
    }

    pub async fn delete_genre(&self, actor: Option<&User>, slug: &str) -> Result<()> {
        delete_taxon(self.genres.as_ref(), actor, slug).await
    }

    pub async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> Result<Page<Title>> {
        self.titles.list_titles(filter, page).await
    }

    pub async fn get_title(&self, id: TitleId) -> Result<Title> {
        self.titles
            .get_title(id)
            .await?
            .ok_or_else(CoreError::not_found)
    }

    pub async fn create_title(&self, actor: Option<&User>, input: TitleInput) -> Result<Title> {
        POLICY.check_request(actor, Access::Write)?;
        let new_title = input.into_new_title(current_year())?;
        let record = self.resolve_new(new_title).await?;
        let title = self.titles.create_title(&record).await?;
        info!(title_id = %title.id, name = %title.name, "title created");
        Ok(title)
    }

    /// `partial` selects PATCH semantics; otherwise every required field must
    /// be present, as for creation.
    pub async fn update_title(
        &self,
        actor: Option<&User>,
        id: TitleId,
        input: TitleInput,
        partial: bool,
    ) -> Result<Title> {
        POLICY.check_request(actor, Access::Write)?;
        self.get_title(id).await?;

        let changes = if partial {
            input.into_changes(current_year())?
        } else {
            let full = input.into_new_title(current_year())?;
            TitleChanges {
                name: Some(full.name),
                year: Some(full.year),
                description: Some(full.description),
                category: Some(full.category),
                genres: Some(full.genres),
            }
        };
        let changes = self.resolve_changes(changes).await?;
        self.titles
            .update_title(id, &changes)
            .await?
            .ok_or_else(CoreError::not_found)
    }

    pub async fn delete_title(&self, actor: Option<&User>, id: TitleId) -> Result<()> {
        POLICY.check_request(actor, Access::Write)?;
        if !self.titles.delete_title(id).await? {
            return Err(CoreError::not_found());
        }
        info!(title_id = %id, "title deleted");
        Ok(())
    }

    async fn resolve_new(&self, title: NewTitle) -> Result<TitleRecord> {
        let mut errors = ValidationErrors::new();
        let category = self.resolve_category(&mut errors, &title.category).await?;
        let genre_ids = self.resolve_genres(&mut errors, &title.genres).await?;
        match category {
            Some(category) if errors.is_empty() => Ok(TitleRecord {
                name: title.name,
                year: title.year,
                description: title.description,
                category_id: category.id,
                genre_ids,
            }),
            _ => Err(CoreError::Validation(errors)),
        }
    }

    async fn resolve_changes(&self, changes: TitleChanges) -> Result<TitleRecordChanges> {
        let mut errors = ValidationErrors::new();
        let category_id = match &changes.category {
            Some(slug) => self
                .resolve_category(&mut errors, slug)
                .await?
                .map(|category| category.id),
            None => None,
        };
        let genre_ids = match &changes.genres {
            Some(slugs) => Some(self.resolve_genres(&mut errors, slugs).await?),
            None => None,
        };
        Ok(errors.finish(TitleRecordChanges {
            name: changes.name,
            year: changes.year,
            description: changes.description,
            category_id,
            genre_ids,
        })?)
    }

    async fn resolve_category(
        &self,
        errors: &mut ValidationErrors,
        slug: &str,
    ) -> Result<Option<Category>> {
        let category = self.categories.get_by_slug(slug).await?;
        if category.is_none() {
            errors.add("category", missing_slug(slug));
        }
        Ok(category)
    }

    async fn resolve_genres(
        &self,
        errors: &mut ValidationErrors,
        slugs: &[String],
    ) -> Result<Vec<GenreId>> {
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            match self.genres.get_by_slug(slug).await? {
                Some(genre) => ids.push(genre.id),
                None => errors.add("genre", missing_slug(slug)),
            }
        }
        Ok(ids)
    }
}

async fn create_taxon<T: TaxonEntity>(
    repo: &dyn TaxonomyRepository<T>,
    actor: Option<&User>,
    input: TaxonInput,
) -> Result<T> {
    POLICY.check_request(actor, Access::Write)?;
    let taxon = input.validate()?;
    let created = repo.create(&taxon).await?;
    info!(kind = T::LABEL, slug = created.slug(), "taxon created");
    Ok(created)
}

async fn delete_taxon<T: TaxonEntity>(
    repo: &dyn TaxonomyRepository<T>,
    actor: Option<&User>,
    slug: &str,
) -> Result<()> {
    POLICY.check_request(actor, Access::Write)?;
    if !repo.delete_by_slug(slug).await? {
        return Err(CoreError::not_found());
    }
    info!(kind = T::LABEL, slug, "taxon deleted");
    Ok(())
}

fn current_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::ports::users::UsersRepository;
    use yamdb_model::{NewUser, Role};

    struct Harness {
        service: CatalogService,
        admin: User,
        reader: User,
    }

    async fn harness() -> Harness {
        let db = Arc::new(MemoryDatabase::new());
        let service = CatalogService::new(&AppUnitOfWork::in_memory(db.clone()));
        let mut admin = NewUser::signup("admin".into(), "admin@yamdb.example".into());
        admin.role = Role::Admin;
        let admin = db.create_user(&admin).await.unwrap();
        let reader = db
            .create_user(&NewUser::signup("reader".into(), "reader@yamdb.example".into()))
            .await
            .unwrap();
        Harness {
            service,
            admin,
            reader,
        }
    }

    fn taxon(name: &str, slug: &str) -> TaxonInput {
        TaxonInput {
            name: Some(name.into()),
            slug: Some(slug.into()),
            ..TaxonInput::default()
        }
    }

    async fn seed(h: &Harness) -> Title {
        h.service
            .create_category(Some(&h.admin), taxon("Movies", "movie"))
            .await
            .unwrap();
        h.service
            .create_genre(Some(&h.admin), taxon("Drama", "drama"))
            .await
            .unwrap();
        h.service
            .create_genre(Some(&h.admin), taxon("Crime", "crime"))
            .await
            .unwrap();
        h.service
            .create_title(
                Some(&h.admin),
                TitleInput {
                    name: Some("The Godfather".into()),
                    year: Some(1972),
                    category: Some("movie".into()),
                    genre: Some(vec!["drama".into(), "crime".into()]),
                    ..TitleInput::default()
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn only_admins_write_the_catalog() {
        let h = harness().await;
        let denied = h
            .service
            .create_category(Some(&h.reader), taxon("Books", "book"))
            .await;
        assert!(matches!(denied, Err(CoreError::Forbidden(_))));
        let anonymous = h.service.delete_genre(None, "drama").await;
        assert!(matches!(anonymous, Err(CoreError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_field_error() {
        let h = harness().await;
        h.service
            .create_category(Some(&h.admin), taxon("Books", "book"))
            .await
            .unwrap();
        let err = h
            .service
            .create_category(Some(&h.admin), taxon("Other books", "book"))
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("slug"));
    }

    #[tokio::test]
    async fn search_and_delete_taxa() {
        let h = harness().await;
        seed(&h).await;
        let page = h
            .service
            .list_genres(Some("dra"), PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(page.count, 1);

        h.service.delete_genre(Some(&h.admin), "drama").await.unwrap();
        assert!(matches!(
            h.service.delete_genre(Some(&h.admin), "drama").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn title_writes_resolve_slugs() {
        let h = harness().await;
        let title = seed(&h).await;
        assert_eq!(title.category_slug(), Some("movie"));
        assert_eq!(title.genre_slugs(), ["crime", "drama"]);
        assert_eq!(title.rating, None);

        let err = h
            .service
            .create_title(
                Some(&h.admin),
                TitleInput {
                    name: Some("Nope".into()),
                    year: Some(2000),
                    category: Some("ghost".into()),
                    genre: Some(vec!["drama".into(), "missing".into()]),
                    ..TitleInput::default()
                },
            )
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(
            fields.messages("category").to_vec(),
            vec![missing_slug("ghost")]
        );
        assert_eq!(fields.messages("genre").to_vec(), vec![missing_slug("missing")]);
    }

    #[tokio::test]
    async fn patch_and_put_differ_on_required_fields() {
        let h = harness().await;
        let title = seed(&h).await;

        let patched = h
            .service
            .update_title(
                Some(&h.admin),
                title.id,
                TitleInput {
                    description: Some("Family business".into()),
                    genre: Some(vec!["crime".into()]),
                    ..TitleInput::default()
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(patched.description, "Family business");
        assert_eq!(patched.genre_slugs(), ["crime"]);
        assert_eq!(patched.year, 1972);

        let err = h
            .service
            .update_title(
                Some(&h.admin),
                title.id,
                TitleInput {
                    name: Some("Renamed".into()),
                    ..TitleInput::default()
                },
                false,
            )
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("year"));
    }

    #[tokio::test]
    async fn filters_and_deletes_titles() {
        let h = harness().await;
        let title = seed(&h).await;
        let filter = TitleFilter {
            genre: Some("crime".into()),
            ..TitleFilter::default()
        };
        let page = h
            .service
            .list_titles(&filter, PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(page.count, 1);

        h.service.delete_title(Some(&h.admin), title.id).await.unwrap();
        assert!(matches!(
            h.service.get_title(title.id).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
