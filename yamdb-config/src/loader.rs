use once_cell::sync::Lazy;
use std::{fs, path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_CONFIRMATION_TTL, DEFAULT_HOST, DEFAULT_MAIL_FROM,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_TOKEN_KEY,
};
use crate::models::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, MailBackend, MailConfig,
    PaginationConfig, ServerConfig,
    sources::{EnvConfig, FileConfig},
};
use crate::util::parse_duration;
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> =
    Lazy::new(|| vec![PathBuf::from("yamdb.toml"), PathBuf::from("config/yamdb.toml")]);

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path)
                .map(|_| true)
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        compose_config(file_config, env_config, config_path, env_file_loaded)
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let resolved = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone())
            .map(|path| (path, true))
            .or_else(|| {
                DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .find(|candidate| candidate.exists())
                    .map(|path| (path.clone(), false))
            });

        let Some((path, explicit)) = resolved else {
            return Ok((None, None));
        };
        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Merges file and environment values over the defaults, then applies the
/// guard rails. Environment values win over the file.
pub fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<ConfigLoad, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No yamdb.toml detected; falling back to environment variables",
            "Pass --config or set YAMDB_CONFIG to use a configuration file",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        auth: file_auth,
        mail: file_mail,
        pagination: file_pagination,
        cors: file_cors,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: parse_number("SERVER_PORT", env.server_port)?
            .or(file_server.port)
            .unwrap_or(DEFAULT_PORT),
    };

    let database_url = env
        .database_url
        .or(file_database.url)
        .filter(|url| !url.trim().is_empty());
    if let Some(url) = &database_url {
        Url::parse(url).map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    }
    let database = DatabaseConfig {
        url: database_url,
        max_connections: parse_number("DB_MAX_CONNECTIONS", env.database_max_connections)?
            .or(file_database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };

    let auth = AuthConfig {
        token_key: env
            .token_key
            .or(file_auth.token_key)
            .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
        access_token_ttl: resolve_duration(
            "access_token_ttl",
            env.access_token_ttl.or(file_auth.access_token_ttl),
            DEFAULT_ACCESS_TOKEN_TTL,
        )?,
        confirmation_ttl: resolve_duration(
            "confirmation_ttl",
            env.confirmation_ttl.or(file_auth.confirmation_ttl),
            DEFAULT_CONFIRMATION_TTL,
        )?,
    };

    let backend = match env.mail_backend.or(file_mail.backend) {
        Some(raw) => raw
            .parse::<MailBackend>()
            .map_err(|value| ConfigLoadError::UnknownMailBackend { value })?,
        None => MailBackend::default(),
    };
    let mail = MailConfig {
        backend,
        from: env
            .mail_from
            .or(file_mail.from)
            .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
        dir: env.mail_dir.or(file_mail.dir),
    };

    let pagination = PaginationConfig {
        page_size: parse_number("YAMDB_PAGE_SIZE", env.page_size)?
            .or(file_pagination.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or_else(default_cors_origins),
        allowed_methods: env
            .cors_allowed_methods
            .or(file_cors.allowed_methods)
            .unwrap_or_else(default_cors_methods),
        allowed_headers: env
            .cors_allowed_headers
            .or(file_cors.allowed_headers)
            .unwrap_or_else(default_cors_headers),
    };

    let config = Config {
        server,
        database,
        auth,
        mail,
        pagination,
        cors,
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok(ConfigLoad { config, warnings })
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigLoadError> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigLoadError::InvalidNumber { field, value })
    })
    .transpose()
}

fn resolve_duration(
    field: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(value) => parse_duration(&value)
            .map_err(|source| ConfigLoadError::InvalidDuration { field, value, source }),
        None => Ok(default),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid duration for {field}: '{value}'")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("unknown mail backend '{value}' (expected console or file)")]
    UnknownMailBackend { value: String },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    vec!["Authorization".to_string(), "Content-Type".to_string()]
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sources::{FileAuthConfig, FileMailConfig, FilePaginationConfig};

    const STRONG_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn strong_env() -> EnvConfig {
        EnvConfig {
            token_key: Some(STRONG_KEY.to_string()),
            database_url: Some("postgres://yamdb@localhost/yamdb".to_string()),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let env = EnvConfig {
            dev_mode: Some(true),
            ..EnvConfig::default()
        };
        let ConfigLoad { config, warnings } = compose_config(None, env, None, false).unwrap();

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.auth.confirmation_ttl, Duration::from_secs(259_200));
        assert_eq!(config.mail.backend, MailBackend::Console);
        assert_eq!(config.mail.from, "yamdb@example.com");
        assert!(config.auth.is_default_token_key());
        assert!(
            warnings
                .iter()
                .any(|warning| warning.message.contains("YAMDB_TOKEN_KEY"))
        );
    }

    #[test]
    fn environment_overrides_file() {
        let file = FileConfig {
            auth: FileAuthConfig {
                access_token_ttl: Some("1h".into()),
                ..FileAuthConfig::default()
            },
            pagination: FilePaginationConfig {
                page_size: Some(25),
            },
            ..FileConfig::default()
        };
        let env = EnvConfig {
            page_size: Some("50".into()),
            ..strong_env()
        };

        let ConfigLoad { config, .. } =
            compose_config(Some(file), env, Some(PathBuf::from("yamdb.toml")), false).unwrap();
        assert_eq!(config.pagination.page_size, 50);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(
            config.metadata.config_path.as_deref(),
            Some(std::path::Path::new("yamdb.toml"))
        );
    }

    #[test]
    fn default_key_is_rejected_outside_dev_mode() {
        let err = compose_config(None, EnvConfig::default(), None, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::WeakSecret { .. })
        ));
    }

    #[test]
    fn page_size_is_bounded() {
        let env = EnvConfig {
            page_size: Some("0".into()),
            ..strong_env()
        };
        let err = compose_config(None, env, None, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::PageSizeOutOfRange { value: 0, .. })
        ));
    }

    #[test]
    fn auth_lifetimes_are_bounded() {
        let env = EnvConfig {
            access_token_ttl: Some("100000years".into()),
            ..strong_env()
        };
        assert!(matches!(
            compose_config(None, env, None, false),
            Err(ConfigLoadError::GuardRail(ConfigGuardRailError::TtlOutOfRange {
                field: "YAMDB_ACCESS_TOKEN_TTL",
                ..
            }))
        ));

        let env = EnvConfig {
            confirmation_ttl: Some("0s".into()),
            ..strong_env()
        };
        assert!(matches!(
            compose_config(None, env, None, false),
            Err(ConfigLoadError::GuardRail(ConfigGuardRailError::TtlOutOfRange {
                field: "YAMDB_CONFIRMATION_TTL",
                ..
            }))
        ));
    }

    #[test]
    fn file_mail_backend_needs_a_directory() {
        let file = FileConfig {
            mail: FileMailConfig {
                backend: Some("file".into()),
                ..FileMailConfig::default()
            },
            ..FileConfig::default()
        };
        let err = compose_config(Some(file), strong_env(), None, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::MissingMailDir)
        ));
    }

    #[test]
    fn malformed_values_are_reported() {
        let env = EnvConfig {
            server_port: Some("eighty".into()),
            ..strong_env()
        };
        assert!(matches!(
            compose_config(None, env, None, false),
            Err(ConfigLoadError::InvalidNumber { field: "SERVER_PORT", .. })
        ));

        let env = EnvConfig {
            confirmation_ttl: Some("forever".into()),
            ..strong_env()
        };
        assert!(matches!(
            compose_config(None, env, None, false),
            Err(ConfigLoadError::InvalidDuration { .. })
        ));

        let env = EnvConfig {
            mail_backend: Some("smtp".into()),
            ..strong_env()
        };
        assert!(matches!(
            compose_config(None, env, None, false),
            Err(ConfigLoadError::UnknownMailBackend { .. })
        ));
    }

    #[test]
    fn wildcard_cors_needs_dev_mode() {
        let env = EnvConfig {
            cors_allowed_origins: Some(vec!["*".into()]),
            ..strong_env()
        };
        assert!(matches!(
            compose_config(None, env, None, false),
            Err(ConfigLoadError::GuardRail(
                ConfigGuardRailError::DangerousCorsWildcard
            ))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new()
            .with_env_file(dir.path().join("absent.env"))
            .with_config_path(dir.path().join("absent.toml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
    }

    #[test]
    fn toml_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yamdb.toml");
        fs::write(
            &path,
            r#"
dev_mode = true

[server]
host = "127.0.0.1"

[mail]
backend = "file"
dir = "sent"

[auth]
confirmation_ttl = "2days"
"#,
        )
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let file: FileConfig = toml::from_str(&contents).unwrap();
        assert_eq!(file.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(file.mail.backend.as_deref(), Some("file"));
        assert_eq!(file.dev_mode, Some(true));

        let ConfigLoad { config, .. } =
            compose_config(Some(file), EnvConfig::default(), Some(path), false).unwrap();
        assert_eq!(config.mail.backend, MailBackend::File);
        assert_eq!(config.auth.confirmation_ttl, Duration::from_secs(172_800));
    }
}
