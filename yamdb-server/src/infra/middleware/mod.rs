pub mod auth;

pub use auth::{Actor, optional_auth_middleware};
