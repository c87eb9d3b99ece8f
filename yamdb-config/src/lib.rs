//! Configuration for the YaMDb review service.
//!
//! Values are layered: a `.env` file feeds the process environment, a TOML
//! file supplies the base, environment variables override it and anything
//! left unset falls back to a default. The composed [`Config`] is checked by
//! guard rails that either reject it or attach [`ConfigWarnings`].

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, MailBackend, MailConfig,
    PaginationConfig, ServerConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
