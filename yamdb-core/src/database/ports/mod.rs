pub mod comments;
pub mod dataset;
pub mod reviews;
pub mod taxonomy;
pub mod titles;
pub mod users;
