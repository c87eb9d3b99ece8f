//! Core data model definitions shared across YaMDb crates.
//!
//! Nothing in here performs I/O. Types carry the field rules the API
//! enforces (see [`validation`]) so that every storage adapter and every
//! handler agrees on what a well-formed user, title or review looks like.

pub mod catalog;
pub mod error;
pub mod feedback;
pub mod ids;
pub mod page;
pub mod role;
pub mod user;
pub mod validation;
pub mod wire;

pub use catalog::{
    Category, Genre, NewTitle, Taxon, TaxonInput, Title, TitleChanges,
    TitleFilter, TitleInput,
};
pub use error::{ModelError, Result as ModelResult, ValidationErrors};
pub use feedback::{
    Comment, CommentChanges, CommentInput, NewComment, NewReview, Review,
    ReviewChanges, ReviewInput,
};
pub use ids::{CategoryId, CommentId, GenreId, ReviewId, TitleId, UserId};
pub use page::{Page, PageRequest};
pub use role::Role;
pub use user::{NewUser, User, UserChanges, UserInput};
