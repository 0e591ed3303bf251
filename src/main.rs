//! Haikubot server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use haikubot::infrastructure::http::{router, AppState};
use haikubot::infrastructure::slack::SlackClient;
use haikubot::{
    BlameTracker, CommandHandler, Config, ConfigLoader, DatabaseConnection, EventQueue,
    LineRepositoryImpl, PoemComposer, PoemRepositoryImpl, Sampler, StatsAggregator,
};

#[derive(Parser, Debug)]
#[command(name = "haikubot", version, about = "Collaborative Slack haiku bot")]
struct Args {
    /// Path to a configuration file (defaults to the .haikubot/ hierarchy)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config);
    info!(version = haikubot::VERSION, "starting haikubot");

    let db = connect_database(&config).await?;

    let lines = Arc::new(LineRepositoryImpl::new(db.pool().clone()));
    let poems = Arc::new(PoemRepositoryImpl::new(db.pool().clone()));

    let sampler = Sampler::new(lines.clone());
    let composer = PoemComposer::new(sampler, poems.clone());
    let stats = StatsAggregator::new(lines.clone(), poems.clone());
    let blame = BlameTracker::new(poems.clone());
    let handler = Arc::new(CommandHandler::new(lines, composer, stats, blame));

    let slack = Arc::new(SlackClient::new(&config.slack)?);
    let events = Arc::new(EventQueue::new(&config.events, handler.clone(), slack));

    let app = router(AppState {
        handler,
        events: events.clone(),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Drain queued Slack events before releasing the database.
    events.shutdown().await;
    db.close().await;
    info!("haikubot stopped");

    Ok(())
}

async fn connect_database(config: &Config) -> Result<DatabaseConnection> {
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let database_url = format!("sqlite:{}", config.database.path);
    let db = DatabaseConnection::new(&database_url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;
    Ok(db)
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");
}
