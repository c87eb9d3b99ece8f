use std::{fmt, sync::Arc};

use anyhow::Context;
use tracing::info;

use yamdb_config::{Config, MailBackend};
use yamdb_core::application::unit_of_work::AppUnitOfWork;
use yamdb_core::application::{AccountService, CatalogService, ReviewService};
use yamdb_core::auth::{AccessTokens, AuthCrypto, ConfirmationCodes};
use yamdb_core::database::postgres::PostgresDatabase;
use yamdb_core::mail::{ConsoleMailer, FileMailer, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub unit_of_work: Arc<AppUnitOfWork>,
    /// Absent when the state runs on non-Postgres repositories.
    pub postgres: Option<Arc<PostgresDatabase>>,
    pub config: Arc<Config>,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub reviews: Arc<ReviewService>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("postgres", &self.postgres.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        unit_of_work: Arc<AppUnitOfWork>,
        postgres: Option<Arc<PostgresDatabase>>,
        config: Arc<Config>,
        mailer: Arc<dyn Mailer>,
    ) -> anyhow::Result<Self> {
        let crypto = AuthCrypto::new(config.auth.token_key.as_bytes())
            .context("token key rejected")?;
        let codes = ConfirmationCodes::new(Arc::new(crypto), config.auth.confirmation_ttl);
        let tokens = AccessTokens::new(
            config.auth.token_key.as_bytes(),
            config.auth.access_token_ttl,
        );

        let accounts = AccountService::new(
            &unit_of_work,
            codes,
            tokens,
            mailer,
            config.mail.from.clone(),
        );
        let catalog = CatalogService::new(&unit_of_work);
        let reviews = ReviewService::new(&unit_of_work);

        Ok(Self {
            unit_of_work,
            postgres,
            config,
            accounts: Arc::new(accounts),
            catalog: Arc::new(catalog),
            reviews: Arc::new(reviews),
        })
    }

    /// Connects to Postgres using the database section of `config`.
    pub async fn connect(config: Arc<Config>) -> anyhow::Result<Self> {
        let url = config
            .database
            .url
            .as_deref()
            .context("DATABASE_URL is not configured")?;
        let postgres = PostgresDatabase::connect(url, config.database.max_connections)
            .await
            .context("failed to connect to Postgres")?;
        let unit_of_work = AppUnitOfWork::from_postgres(&postgres)
            .map_err(|err| anyhow::anyhow!(err))
            .context("failed to assemble repositories")?;
        let mailer = mailer_from_config(&config);

        Self::new(
            Arc::new(unit_of_work),
            Some(Arc::new(postgres)),
            config,
            mailer,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn page_size(&self) -> u32 {
        self.config.pagination.page_size
    }
}

pub fn mailer_from_config(config: &Config) -> Arc<dyn Mailer> {
    match (config.mail.backend, config.mail.dir.as_ref()) {
        (MailBackend::File, Some(dir)) => {
            info!(dir = %dir.display(), "mail backend: file");
            Arc::new(FileMailer::new(dir.clone()))
        }
        _ => {
            info!("mail backend: console");
            Arc::new(ConsoleMailer)
        }
    }
}
