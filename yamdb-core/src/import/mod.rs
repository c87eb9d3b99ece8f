//! Bulk load of the reference data set from a directory of CSV files.
//!
//! Files are read in dependency order so foreign keys always point at rows
//! that already exist. Rows keep the ids from the files; once everything is
//! written the id sequences are moved past the imported maximum so new rows
//! do not collide.

mod rows;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::unit_of_work::AppUnitOfWork;
use crate::database::ports::dataset::DatasetWriter;
use crate::error::CoreError;

pub use rows::{CategoryCsv, CommentCsv, GenreCsv, GenreTitleCsv, ReviewCsv, TitleCsv, UserCsv};

pub const CATEGORY_FILE: &str = "category.csv";
pub const GENRE_FILE: &str = "genre.csv";
pub const USERS_FILE: &str = "users.csv";
pub const TITLES_FILE: &str = "titles.csv";
pub const GENRE_TITLE_FILE: &str = "genre_title.csv";
pub const REVIEW_FILE: &str = "review.csv";
pub const COMMENTS_FILE: &str = "comments.csv";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("required file {} is missing", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to store rows from {file}: {source}")]
    Store {
        file: &'static str,
        #[source]
        source: CoreError,
    },
}

/// Rows written per file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories: u64,
    pub genres: u64,
    pub users: u64,
    pub titles: u64,
    pub genre_links: u64,
    pub reviews: u64,
    pub comments: u64,
}

impl ImportSummary {
    pub fn total(&self) -> u64 {
        self.categories
            + self.genres
            + self.users
            + self.titles
            + self.genre_links
            + self.reviews
            + self.comments
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} categories, {} genres, {} users, {} titles, {} genre links, {} reviews, {} comments",
            self.categories,
            self.genres,
            self.users,
            self.titles,
            self.genre_links,
            self.reviews,
            self.comments
        )
    }
}

pub struct CsvImporter<'a> {
    dir: PathBuf,
    writer: &'a dyn DatasetWriter,
}

impl fmt::Debug for CsvImporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvImporter")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl<'a> CsvImporter<'a> {
    pub fn new(dir: impl Into<PathBuf>, writer: &'a dyn DatasetWriter) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }

    pub fn from_unit_of_work(dir: impl Into<PathBuf>, uow: &'a AppUnitOfWork) -> Self {
        Self::new(dir, uow.dataset.as_ref())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn run(&self) -> Result<ImportSummary, ImportError> {
        info!(dir = %self.dir.display(), "starting CSV import");
        let mut summary = ImportSummary::default();

        let categories: Vec<CategoryCsv> = self.required(CATEGORY_FILE).await?;
        let rows: Vec<_> = categories.into_iter().map(Into::into).collect();
        summary.categories = store(CATEGORY_FILE, self.writer.upsert_categories(&rows)).await?;

        let genres: Vec<GenreCsv> = self.required(GENRE_FILE).await?;
        let rows: Vec<_> = genres.into_iter().map(Into::into).collect();
        summary.genres = store(GENRE_FILE, self.writer.upsert_genres(&rows)).await?;

        let users: Vec<UserCsv> = self.required(USERS_FILE).await?;
        let rows: Vec<_> = users.into_iter().map(Into::into).collect();
        summary.users = store(USERS_FILE, self.writer.upsert_users(&rows)).await?;

        let titles: Vec<TitleCsv> = self.required(TITLES_FILE).await?;
        let rows: Vec<_> = titles.into_iter().map(Into::into).collect();
        summary.titles = store(TITLES_FILE, self.writer.upsert_titles(&rows)).await?;

        if let Some(links) = self.optional::<GenreTitleCsv>(GENRE_TITLE_FILE).await? {
            let rows: Vec<_> = links.into_iter().map(Into::into).collect();
            summary.genre_links = store(GENRE_TITLE_FILE, self.writer.link_genres(&rows)).await?;
        }

        let reviews: Vec<ReviewCsv> = self.required(REVIEW_FILE).await?;
        let rows: Vec<_> = reviews.into_iter().map(Into::into).collect();
        summary.reviews = store(REVIEW_FILE, self.writer.upsert_reviews(&rows)).await?;

        let comments: Vec<CommentCsv> = self.required(COMMENTS_FILE).await?;
        let rows: Vec<_> = comments.into_iter().map(Into::into).collect();
        summary.comments = store(COMMENTS_FILE, self.writer.upsert_comments(&rows)).await?;

        self.writer
            .realign_sequences()
            .await
            .map_err(|source| ImportError::Store {
                file: "sequences",
                source,
            })?;

        info!(rows = summary.total(), %summary, "CSV import finished");
        Ok(summary)
    }

    async fn required<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, ImportError> {
        self.optional(file)
            .await?
            .ok_or_else(|| ImportError::MissingFile(self.dir.join(file)))
    }

    async fn optional<T: DeserializeOwned>(
        &self,
        file: &str,
    ) -> Result<Option<Vec<T>>, ImportError> {
        let path = self.dir.join(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "CSV file not present");
                return Ok(None);
            }
            Err(source) => return Err(ImportError::Io { path, source }),
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(bytes.as_slice());
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .map_err(|source| ImportError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), rows = rows.len(), "parsed CSV file");
        Ok(Some(rows))
    }
}

async fn store(
    file: &'static str,
    write: impl Future<Output = crate::error::Result<u64>>,
) -> Result<u64, ImportError> {
    write
        .await
        .map_err(|source| ImportError::Store { file, source })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::ports::reviews::ReviewsRepository;
    use crate::database::ports::taxonomy::TaxonomyRepository;
    use crate::database::ports::titles::TitlesRepository;
    use crate::database::ports::users::UsersRepository;
    use yamdb_model::{Category, NewUser, PageRequest, Role, Taxon, TitleId};

    fn write(dir: &Path, file: &str, contents: &str) {
        std::fs::write(dir.join(file), contents).unwrap();
    }

    fn write_dataset(dir: &Path) {
        write(dir, CATEGORY_FILE, "id,name,slug\n1,Фильм,movie\n2,Книга,book\n");
        write(dir, GENRE_FILE, "id,name,slug\n1,Драма,drama\n2,Комедия,comedy\n");
        write(
            dir,
            USERS_FILE,
            "id,username,email,role,bio,first_name,last_name\n\
             100,bingobongo,bingobongo@yamdb.fake,user,,,\n\
             101,capt_obvious,capt_obvious@yamdb.fake,admin,,Капитан,\n",
        );
        write(
            dir,
            TITLES_FILE,
            "id,name,year,category\n1,Побег из Шоушенка,1994,1\n2,Крестный отец,1972,\n",
        );
        write(dir, GENRE_TITLE_FILE, "id,title_id,genre_id\n1,1,1\n2,1,2\n3,2,1\n");
        write(
            dir,
            REVIEW_FILE,
            "id,title_id,text,author,score,pub_date\n\
             1,1,Ничего особенного,100,5,2019-09-24T21:08:21.567Z\n\
             2,1,Шедевр,101,10,2019-09-25T10:00:00.000Z\n",
        );
        write(
            dir,
            COMMENTS_FILE,
            "id,review_id,text,author,pub_date\n1,1,Критик фигов,101,2019-09-26T09:00:00Z\n",
        );
    }

    #[tokio::test]
    async fn imports_the_whole_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let db = Arc::new(MemoryDatabase::new());

        let summary = CsvImporter::new(dir.path(), db.as_ref()).run().await.unwrap();
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.users, 2);
        assert_eq!(summary.genre_links, 3);
        assert_eq!(summary.comments, 1);
        assert_eq!(summary.total(), 14);

        let title = db.get_title(TitleId(1)).await.unwrap().unwrap();
        assert_eq!(title.category_slug(), Some("movie"));
        assert_eq!(title.genres.len(), 2);
        assert_eq!(title.rating_score(), Some(7));

        let orphan = db.get_title(TitleId(2)).await.unwrap().unwrap();
        assert!(orphan.category.is_none());

        let admin = db.get_user_by_username("capt_obvious").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.first_name, "Капитан");

        let reviews = db.list_reviews(TitleId(1), PageRequest::first(10)).await.unwrap();
        assert_eq!(reviews.count, 2);
        assert_eq!(reviews.items[0].author, "capt_obvious");
    }

    #[tokio::test]
    async fn new_rows_continue_after_imported_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let db = Arc::new(MemoryDatabase::new());
        CsvImporter::new(dir.path(), db.as_ref()).run().await.unwrap();

        let user = db
            .create_user(&NewUser::signup("fresh".into(), "fresh@yamdb.example".into()))
            .await
            .unwrap();
        assert_eq!(user.id.get(), 102);

        let category = TaxonomyRepository::<Category>::create(
            db.as_ref(),
            &Taxon {
                name: "Музыка".into(),
                slug: "music".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(category.id.get(), 3);
    }

    #[tokio::test]
    async fn genre_links_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        std::fs::remove_file(dir.path().join(GENRE_TITLE_FILE)).unwrap();
        let db = MemoryDatabase::new();

        let summary = CsvImporter::new(dir.path(), &db).run().await.unwrap();
        assert_eq!(summary.genre_links, 0);
    }

    #[tokio::test]
    async fn missing_required_file_is_named() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        std::fs::remove_file(dir.path().join(REVIEW_FILE)).unwrap();
        let db = MemoryDatabase::new();

        let err = CsvImporter::new(dir.path(), &db).run().await.unwrap_err();
        assert!(matches!(err, ImportError::MissingFile(_)));
        assert!(err.to_string().contains(REVIEW_FILE));
    }

    #[tokio::test]
    async fn malformed_rows_report_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        write(dir.path(), TITLES_FILE, "id,name,year,category\nx,Broken,year,1\n");
        let db = MemoryDatabase::new();

        let err = CsvImporter::new(dir.path(), &db).run().await.unwrap_err();
        assert!(matches!(err, ImportError::Parse { .. }));
        assert!(err.to_string().contains(TITLES_FILE));
    }
}
