//! Persistence: repository ports plus the Postgres and in-memory adapters.

pub mod ports;

#[cfg(feature = "database")]
pub mod postgres;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use yamdb_model::error::NON_FIELD_ERRORS;

use crate::error::CoreError;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";
pub const DUPLICATE_REVIEW: &str = "You have already reviewed this title.";

/// Maps a unique constraint name from the schema to the field error clients
/// see. Both adapters report conflicts through here.
pub fn conflict_for(constraint: &str) -> Option<CoreError> {
    let error = match constraint {
        "users_username_key" => CoreError::conflict("username", USERNAME_TAKEN),
        "users_email_key" => CoreError::conflict("email", EMAIL_TAKEN),
        "categories_slug_key" => {
            CoreError::conflict("slug", "category with this slug already exists.")
        }
        "genres_slug_key" => CoreError::conflict("slug", "genre with this slug already exists."),
        "unique_title_author" => CoreError::conflict(NON_FIELD_ERRORS, DUPLICATE_REVIEW),
        _ => return None,
    };
    Some(error)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE`.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_constraints_become_field_errors() {
        let err = conflict_for("unique_title_author").unwrap();
        let fields = err.field_errors().unwrap();
        assert_eq!(
            fields.messages(NON_FIELD_ERRORS).to_vec(),
            vec![DUPLICATE_REVIEW.to_string()]
        );
        assert!(conflict_for("some_other_key").is_none());
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
