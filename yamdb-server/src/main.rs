use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yamdb_config::{Config, ConfigLoad, ConfigLoader};
use yamdb_core::import::CsvImporter;
use yamdb_server::{AppState, create_app};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "yamdb-server")]
#[command(about = "Review service API for films, books and music")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(long, env = "YAMDB_CONFIG")]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
    /// Load the CSV data set into an empty database and exit
    ImportCsv {
        /// Directory holding category.csv, genre.csv, titles.csv and friends
        #[arg(long, default_value = "static/data")]
        dir: PathBuf,
    },
    /// Create an administrator account with superuser rights and exit
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(config).await,
        Some(Command::ImportCsv { dir }) => run_import(config, dir).await,
        Some(Command::CreateSuperuser { username, email }) => {
            run_create_superuser(config, username, email).await
        }
        None => run_server(config).await,
    }
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Arc<Config>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad { mut config, warnings } =
        loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(Arc::new(config))
}

async fn run_db_migrate(config: Arc<Config>) -> anyhow::Result<()> {
    let state = AppState::connect(config).await?;
    let postgres = state
        .postgres
        .as_ref()
        .context("migrations need a Postgres connection")?;
    postgres
        .migrate()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_import(config: Arc<Config>, dir: PathBuf) -> anyhow::Result<()> {
    let state = AppState::connect(config).await?;
    let summary = CsvImporter::from_unit_of_work(&dir, &state.unit_of_work)
        .run()
        .await
        .with_context(|| format!("import from {} failed", dir.display()))?;
    info!(total = summary.total(), "imported {summary}");
    Ok(())
}

async fn run_create_superuser(
    config: Arc<Config>,
    username: String,
    email: String,
) -> anyhow::Result<()> {
    let state = AppState::connect(config).await?;
    let user = state
        .accounts
        .create_superuser(username, email)
        .await
        .context("failed to create superuser")?;
    info!(username = %user.username, "superuser created");
    Ok(())
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    let bind_address = config.server.bind_address();
    let state = AppState::connect(config).await?;

    if let Some(postgres) = state.postgres.as_ref() {
        postgres
            .migrate()
            .await
            .context("database migration failed")?;
    }

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(address = %bind_address, "YaMDb API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
