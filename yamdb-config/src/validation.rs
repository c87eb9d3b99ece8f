use std::time::Duration;

use thiserror::Error;

use crate::constants::{MAX_AUTH_TTL, MAX_PAGE_SIZE, MIN_TOKEN_KEY_LENGTH};
use crate::models::{AuthConfig, Config, MailBackend};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
    #[error("page size must be between 1 and {max}, got {value}")]
    PageSizeOutOfRange { value: u32, max: u32 },
    #[error("mail backend 'file' requires YAMDB_MAIL_DIR or mail.dir")]
    MissingMailDir,
    #[error("database pool needs at least one connection")]
    EmptyPool,
    #[error("{field} must be between 1s and {}, got {}", human(.max), human(.value))]
    TtlOutOfRange {
        field: &'static str,
        value: Duration,
        max: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let page_size = config.pagination.page_size;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ConfigGuardRailError::PageSizeOutOfRange {
            value: page_size,
            max: MAX_PAGE_SIZE,
        });
    }

    if config.database.max_connections == 0 {
        return Err(ConfigGuardRailError::EmptyPool);
    }

    check_ttl("YAMDB_ACCESS_TOKEN_TTL", config.auth.access_token_ttl)?;
    check_ttl("YAMDB_CONFIRMATION_TTL", config.auth.confirmation_ttl)?;

    if config.mail.backend == MailBackend::File && config.mail.dir.is_none() {
        return Err(ConfigGuardRailError::MissingMailDir);
    }

    if config.dev_mode {
        if config.auth.is_default_token_key() {
            warnings.push_with_hint(
                "YAMDB_TOKEN_KEY uses the default placeholder; tokens are forgeable",
                "Set YAMDB_TOKEN_KEY to a random value of at least 32 characters",
            );
        }
    } else {
        enforce_secret(&config.auth)?;
        if config.cors.is_wildcard_included() {
            return Err(ConfigGuardRailError::DangerousCorsWildcard);
        }
    }

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "DATABASE_URL not configured",
            "The server and database commands need a PostgreSQL connection URL",
        );
    }

    Ok(warnings)
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

fn check_ttl(field: &'static str, value: Duration) -> Result<(), ConfigGuardRailError> {
    if value < Duration::from_secs(1) || value > MAX_AUTH_TTL {
        return Err(ConfigGuardRailError::TtlOutOfRange {
            field,
            value,
            max: MAX_AUTH_TTL,
        });
    }
    Ok(())
}

fn enforce_secret(auth: &AuthConfig) -> Result<(), ConfigGuardRailError> {
    if auth.is_default_token_key() {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "YAMDB_TOKEN_KEY",
            reason: "uses the default placeholder value".into(),
        });
    }

    if auth.token_key.len() < MIN_TOKEN_KEY_LENGTH {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "YAMDB_TOKEN_KEY",
            reason: format!("must be at least {MIN_TOKEN_KEY_LENGTH} characters"),
        });
    }

    Ok(())
}
