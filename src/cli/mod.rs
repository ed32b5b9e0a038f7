use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::app::app;
use crate::config::{AppConfig, Environment};
use crate::database::{MemoryStore, PgStore, Store};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Job board API - companies, job postings and applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on; overrides JOBBOARD_PORT/PORT")]
        port: Option<u16>,

        #[arg(long, help = "Keep all data in memory instead of PostgreSQL")]
        memory: bool,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        memory: false,
    }) {
        Commands::Serve { port, memory } => serve(config, port, memory).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgStore> {
    let store = PgStore::connect(&config.database)
        .await
        .context("failed to connect to PostgreSQL")?;
    store.migrate().await.context("failed to apply migrations")?;
    Ok(store)
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    if config.database.url.is_none() {
        bail!("DATABASE_URL must be set to run migrations");
    }
    let store = connect(&config).await?;
    store.close().await;
    tracing::info!("Migrations applied");
    Ok(())
}

async fn serve(mut config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    tracing::info!("Starting job board API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = if memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else if config.database.url.is_some() {
        Arc::new(connect(&config).await?)
    } else if config.environment == Environment::Development {
        tracing::warn!("DATABASE_URL is not set; falling back to the in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        bail!("DATABASE_URL must be set in {:?} mode", config.environment);
    };

    let port = config.server.port;
    let state = AppState::new(config, store);
    state
        .resumes
        .ensure_dir()
        .await
        .with_context(|| format!("cannot create upload directory {}", state.resumes.dir().display()))?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Job board API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
