//! # YaMDb Core
//!
//! Core library for the YaMDb review service: persistence ports and their
//! adapters, authentication primitives and the application services the
//! HTTP layer delegates to.
//!
//! ## Feature Flags
//!
//! - `database`: PostgreSQL adapters and embedded migrations (SQLx)
//! - `test-utils`: in-memory repositories and a recording mailer
//!
//! ## Architecture
//!
//! - [`database`]: repository ports plus Postgres and in-memory adapters
//! - [`auth`]: confirmation codes, access tokens and the permission policy
//! - [`application`]: account, catalog and review services
//! - [`mail`]: outgoing email backends
//! - [`import`]: CSV bulk load of the reference data set
//! - [`api`]: route constants shared with clients and tests

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Route constants for the versioned API
pub mod api;

pub mod application;
pub mod auth;

/// Repository ports and storage adapters
pub mod database;

pub mod error;
pub mod import;
pub mod mail;

pub use application::{AccountService, AppUnitOfWork, CatalogService, ReviewService};
pub use error::{CoreError, Result};

/// Schema migrations under `yamdb-core/migrations`, embedded at build time.
#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
