pub mod auth;
pub mod extract;
pub mod pagination;
pub mod reviews;
pub mod taxonomy;
pub mod titles;
pub mod users;
