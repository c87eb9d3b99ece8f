//! Field rules shared by every write path.
//!
//! Each helper records into a [`ValidationErrors`] instead of returning early
//! so a single request reports every offending field at once.

use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationErrors;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const TAXON_NAME_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;
pub const TITLE_NAME_MAX_LEN: usize = 256;
pub const SCORE_RANGE: RangeInclusive<i32> = 1..=10;

/// Collides with the `/users/me/` endpoint.
pub const RESERVED_USERNAME: &str = "me";

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("valid email regex")
});

/// Trims and checks a mandatory text field. Returns the trimmed value when
/// it is present and non-blank.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    match value.map(str::trim) {
        None => {
            missing(errors, field);
            None
        }
        Some("") => {
            errors.add(field, MSG_BLANK);
            None
        }
        Some(text) => Some(text.to_string()),
    }
}

/// Records an absent mandatory field, unless it already failed to decode.
pub fn missing(errors: &mut ValidationErrors, field: &str) {
    if !errors.contains(field) {
        errors.add(field, MSG_REQUIRED);
    }
}

/// Like [`required_text`] but only applies when the field was sent; used by
/// partial updates.
pub fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    value.and_then(|value| required_text(errors, field, Some(value)))
}

pub fn max_len(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max: usize,
) -> bool {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
        false
    } else {
        true
    }
}

pub fn check_username(errors: &mut ValidationErrors, value: &str) {
    if !max_len(errors, "username", value, USERNAME_MAX_LEN) {
        return;
    }
    if !USERNAME_RE.is_match(value) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, \
             numbers, and @/./+/-/_ characters.",
        );
    } else if value == RESERVED_USERNAME {
        errors.add("username", "Username \"me\" is reserved.");
    }
}

pub fn check_email(errors: &mut ValidationErrors, value: &str) {
    if !max_len(errors, "email", value, EMAIL_MAX_LEN) {
        return;
    }
    if !EMAIL_RE.is_match(value) {
        errors.add("email", "Enter a valid email address.");
    }
}

pub fn check_slug(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !max_len(errors, field, value, SLUG_MAX_LEN) {
        return;
    }
    if !SLUG_RE.is_match(value) {
        errors.add(
            field,
            "Enter a valid \"slug\" consisting of letters, numbers, \
             underscores or hyphens.",
        );
    }
}

pub fn check_year(errors: &mut ValidationErrors, year: i32, current_year: i32) {
    if year > current_year {
        errors.add(
            "year",
            format!(
                "Year cannot be greater than the current year {current_year}."
            ),
        );
    }
}

pub fn check_score(errors: &mut ValidationErrors, score: i32) {
    if score < *SCORE_RANGE.start() {
        errors.add(
            "score",
            format!(
                "Ensure this value is greater than or equal to {}.",
                SCORE_RANGE.start()
            ),
        );
    } else if score > *SCORE_RANGE.end() {
        errors.add(
            "score",
            format!(
                "Ensure this value is less than or equal to {}.",
                SCORE_RANGE.end()
            ),
        );
    }
}
