//! Record layouts of the CSV files. Header names follow the published data
//! set, where foreign keys are plain ids under the relation name.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use yamdb_model::{
    Category, CategoryId, CommentId, Genre, GenreId, ReviewId, Role, TitleId, UserId,
};

use crate::database::ports::dataset::{CommentRow, GenreLink, ReviewRow, TitleRow, UserRow};

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCsv {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<CategoryCsv> for Category {
    fn from(row: CategoryCsv) -> Self {
        Category {
            id: CategoryId(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreCsv {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<GenreCsv> for Genre {
    fn from(row: GenreCsv) -> Self {
        Genre {
            id: GenreId(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCsv {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<UserCsv> for UserRow {
    fn from(row: UserCsv) -> Self {
        UserRow {
            id: UserId(row.id),
            username: row.username,
            email: row.email,
            role: row.role,
            bio: row.bio,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleCsv {
    pub id: i64,
    pub name: String,
    pub year: i32,
    /// Category id; empty when the title is uncategorised.
    pub category: Option<i64>,
}

impl From<TitleCsv> for TitleRow {
    fn from(row: TitleCsv) -> Self {
        TitleRow {
            id: TitleId(row.id),
            name: row.name,
            year: row.year,
            category_id: row.category.map(CategoryId),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreTitleCsv {
    pub title_id: i64,
    pub genre_id: i64,
}

impl From<GenreTitleCsv> for GenreLink {
    fn from(row: GenreTitleCsv) -> Self {
        GenreLink {
            title_id: TitleId(row.title_id),
            genre_id: GenreId(row.genre_id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCsv {
    pub id: i64,
    pub title_id: i64,
    pub text: String,
    /// Author user id.
    pub author: i64,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

impl From<ReviewCsv> for ReviewRow {
    fn from(row: ReviewCsv) -> Self {
        ReviewRow {
            id: ReviewId(row.id),
            title_id: TitleId(row.title_id),
            author_id: UserId(row.author),
            text: row.text,
            score: row.score,
            pub_date: row.pub_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentCsv {
    pub id: i64,
    pub review_id: i64,
    pub text: String,
    pub author: i64,
    pub pub_date: DateTime<Utc>,
}

impl From<CommentCsv> for CommentRow {
    fn from(row: CommentCsv) -> Self {
        CommentRow {
            id: CommentId(row.id),
            review_id: ReviewId(row.review_id),
            author_id: UserId(row.author),
            text: row.text,
            pub_date: row.pub_date,
        }
    }
}
