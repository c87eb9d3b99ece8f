//! Reviews of titles and comments on reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, ValidationErrors};
use crate::ids::{CommentId, ReviewId, TitleId, UserId};
use crate::{validation, wire};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub title_id: TitleId,
    pub author_id: UserId,
    /// Username of the author at read time.
    pub author: String,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub author_id: UserId,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub title_id: TitleId,
    pub author_id: UserId,
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewChanges {
    pub text: Option<String>,
    pub score: Option<i32>,
}

impl ReviewChanges {
    pub fn apply(&self, review: &mut Review) {
        if let Some(text) = &self.text {
            review.text = text.clone();
        }
        if let Some(score) = self.score {
            review.score = score;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub review_id: ReviewId,
    pub author_id: UserId,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentChanges {
    pub text: Option<String>,
}

/// Review body as sent by clients. Title and author come from the request
/// context and are never read from the payload.
#[derive(Debug, Clone, Default)]
pub struct ReviewInput {
    pub text: Option<String>,
    pub score: Option<i32>,
    /// Fields that arrived with the wrong JSON type.
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for ReviewInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            text: Option<Value>,
            score: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(ReviewInput {
            text: wire::text(&mut decode_errors, "text", raw.text),
            score: wire::integer(&mut decode_errors, "score", raw.score),
            decode_errors,
        })
    }
}

impl ReviewInput {
    pub fn into_new_review(self, title_id: TitleId, author_id: UserId) -> Result<NewReview> {
        let mut errors = self.decode_errors;
        let text = validation::required_text(&mut errors, "text", self.text.as_deref());
        match self.score {
            Some(score) => validation::check_score(&mut errors, score),
            None => validation::missing(&mut errors, "score"),
        }
        errors.finish(NewReview {
            title_id,
            author_id,
            text: text.unwrap_or_default(),
            score: self.score.unwrap_or_default(),
        })
    }

    pub fn into_changes(self) -> Result<ReviewChanges> {
        let mut errors = self.decode_errors;
        let text = validation::optional_text(&mut errors, "text", self.text.as_deref());
        if let Some(score) = self.score {
            validation::check_score(&mut errors, score);
        }
        errors.finish(ReviewChanges {
            text,
            score: self.score,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub text: Option<String>,
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for CommentInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            text: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(CommentInput {
            text: wire::text(&mut decode_errors, "text", raw.text),
            decode_errors,
        })
    }
}

impl CommentInput {
    pub fn into_new_comment(self, review_id: ReviewId, author_id: UserId) -> Result<NewComment> {
        let mut errors = self.decode_errors;
        let text = validation::required_text(&mut errors, "text", self.text.as_deref());
        errors.finish(NewComment {
            review_id,
            author_id,
            text: text.unwrap_or_default(),
        })
    }

    pub fn into_changes(self) -> Result<CommentChanges> {
        let mut errors = self.decode_errors;
        let text = validation::optional_text(&mut errors, "text", self.text.as_deref());
        errors.finish(CommentChanges { text })
    }
}
