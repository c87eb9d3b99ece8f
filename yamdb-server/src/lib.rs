//! HTTP surface of the YaMDb review service.
//!
//! [`infra::startup::create_app`] builds the router from an [`AppState`];
//! the binary in `main.rs` wires configuration, Postgres and the mail
//! backend into that state.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use infra::startup::create_app;
