use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hbnb::config::Config;
use hbnb::facade::Facade;
use hbnb::AppState;

#[derive(Parser, Debug)]
#[command(name = "hbnb")]
#[command(author, version, about = "Property-rental listing backend", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "HBNB_CONFIG", default_value = "hbnb.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long, env = "HBNB_LOG_LEVEL")]
    log_level: Option<String>,

    /// Override the token signing secret
    #[arg(long, env = "HBNB_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(secret) = cli.jwt_secret {
        config.auth.jwt_secret = secret;
    }

    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HBnB v{}", env!("CARGO_PKG_VERSION"));

    let db = hbnb::db::init(&config.server.data_dir).await?;
    let facade = Facade::new(db.clone());

    if let Some((email, password)) = config.admin_credentials() {
        facade
            .ensure_admin_user(email, password)
            .await
            .context("Failed to bootstrap admin user")?;
    }

    let mut state = AppState::new(config.clone(), db, facade);
    if config.metrics.enabled {
        let handle = hbnb::api::metrics::init_metrics()
            .context("Failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }

    let app = hbnb::api::create_router(Arc::new(state));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
