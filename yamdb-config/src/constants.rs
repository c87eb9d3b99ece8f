use std::time::Duration;

/// Placeholder signing key; accepted only in dev mode.
pub const DEFAULT_TOKEN_KEY: &str = "change-me-yamdb-token-key";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_CONFIRMATION_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);
/// Upper bound for either auth lifetime.
pub const MAX_AUTH_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub const DEFAULT_MAIL_FROM: &str = "yamdb@example.com";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 1000;

pub const MIN_TOKEN_KEY_LENGTH: usize = 32;
