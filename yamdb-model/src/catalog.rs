use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, ValidationErrors};
use crate::ids::{CategoryId, GenreId, TitleId};
use crate::validation::{self, TAXON_NAME_MAX_LEN, TITLE_NAME_MAX_LEN};
use crate::wire;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    pub slug: String,
}

/// Validated name/slug pair; categories and genres share the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default)]
pub struct TaxonInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for TaxonInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: Option<Value>,
            slug: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(TaxonInput {
            name: wire::text(&mut decode_errors, "name", raw.name),
            slug: wire::text(&mut decode_errors, "slug", raw.slug),
            decode_errors,
        })
    }
}

impl TaxonInput {
    pub fn validate(self) -> Result<Taxon> {
        let mut errors = self.decode_errors;
        let name = validation::required_text(&mut errors, "name", self.name.as_deref());
        if let Some(name) = &name {
            validation::max_len(&mut errors, "name", name, TAXON_NAME_MAX_LEN);
        }
        let slug = validation::required_text(&mut errors, "slug", self.slug.as_deref());
        if let Some(slug) = &slug {
            validation::check_slug(&mut errors, "slug", slug);
        }
        errors.finish(Taxon {
            name: name.unwrap_or_default(),
            slug: slug.unwrap_or_default(),
        })
    }
}

/// A title as every read path returns it: with its category, genres and
/// the mean score of its reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    pub rating: Option<f64>,
}

impl Title {
    /// Whole-number rating; the fractional part is truncated.
    pub fn rating_score(&self) -> Option<i64> {
        self.rating.map(|rating| rating.trunc() as i64)
    }

    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.slug.as_str())
    }

    pub fn genre_slugs(&self) -> Vec<&str> {
        self.genres.iter().map(|genre| genre.slug.as_str()).collect()
    }
}

/// Title fields as they arrive on the wire; relations are referenced by slug.
#[derive(Debug, Clone, Default)]
pub struct TitleInput {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
    /// Fields that arrived with the wrong JSON type.
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for TitleInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: Option<Value>,
            year: Option<Value>,
            description: Option<Value>,
            category: Option<Value>,
            genre: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(TitleInput {
            name: wire::text(&mut decode_errors, "name", raw.name),
            year: wire::integer(&mut decode_errors, "year", raw.year),
            description: wire::text(&mut decode_errors, "description", raw.description),
            category: wire::text(&mut decode_errors, "category", raw.category),
            genre: wire::slug_list(&mut decode_errors, "genre", raw.genre),
            decode_errors,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genres: Option<Vec<String>>,
}

impl TitleInput {
    pub fn into_new_title(self, current_year: i32) -> Result<NewTitle> {
        let mut errors = self.decode_errors;

        let name = validation::required_text(&mut errors, "name", self.name.as_deref());
        if let Some(name) = &name {
            validation::max_len(&mut errors, "name", name, TITLE_NAME_MAX_LEN);
        }
        match self.year {
            Some(year) => validation::check_year(&mut errors, year, current_year),
            None => validation::missing(&mut errors, "year"),
        }
        let category =
            validation::required_text(&mut errors, "category", self.category.as_deref());
        if self.genre.is_none() {
            validation::missing(&mut errors, "genre");
        }

        errors.finish(NewTitle {
            name: name.unwrap_or_default(),
            year: self.year.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: category.unwrap_or_default(),
            genres: dedup_slugs(self.genre.unwrap_or_default()),
        })
    }

    pub fn into_changes(self, current_year: i32) -> Result<TitleChanges> {
        let mut errors = self.decode_errors;

        let name = validation::optional_text(&mut errors, "name", self.name.as_deref());
        if let Some(name) = &name {
            validation::max_len(&mut errors, "name", name, TITLE_NAME_MAX_LEN);
        }
        if let Some(year) = self.year {
            validation::check_year(&mut errors, year, current_year);
        }
        let category =
            validation::optional_text(&mut errors, "category", self.category.as_deref());

        errors.finish(TitleChanges {
            name,
            year: self.year,
            description: self.description,
            category,
            genres: self.genre.map(dedup_slugs),
        })
    }
}

fn dedup_slugs(slugs: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let slug = slug.trim().to_string();
        if !out.contains(&slug) {
            out.push(slug);
        }
    }
    out
}

/// Query-string filters accepted by the title listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TitleFilter {
    /// Category slug, exact.
    pub category: Option<String>,
    /// Genre slug, exact.
    pub genre: Option<String>,
    /// Case-insensitive substring of the title name.
    pub name: Option<String>,
    pub year: Option<i32>,
}

impl TitleFilter {
    pub fn matches(&self, title: &Title) -> bool {
        if let Some(slug) = &self.category
            && title.category_slug() != Some(slug.as_str())
        {
            return false;
        }
        if let Some(slug) = &self.genre
            && !title.genres.iter().any(|genre| &genre.slug == slug)
        {
            return false;
        }
        if let Some(name) = &self.name
            && !title.name.to_lowercase().contains(&name.to_lowercase())
        {
            return false;
        }
        if let Some(year) = self.year
            && title.year != year
        {
            return false;
        }
        true
    }
}
