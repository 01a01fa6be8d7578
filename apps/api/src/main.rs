//! # Ward API Server
//!
//! ## Usage
//! ```bash
//! # Serve with the default / platform config
//! ward-api
//!
//! # Serve with an explicit config file
//! ward-api --config ./ward.toml
//!
//! # Print an Admin bearer token signed with the configured secret
//! ward-api issue-token alice
//! ```

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ward_api::{router, ApiConfig, AppState};
use ward_db::Database;

enum Command {
    Serve,
    IssueToken(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let (command, config_path) = parse_args(std::env::args().skip(1))?;
    let config = ApiConfig::load(config_path).context("Failed to load configuration")?;

    if config.uses_dev_secret() {
        warn!("Using the built-in development JWT secret; set WARD_JWT_SECRET in production");
    }

    match command {
        Command::IssueToken(subject) => issue_token(&config, &subject),
        Command::Serve => serve(config).await,
    }
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> anyhow::Result<(Command, Option<PathBuf>)> {
    let mut command = Command::Serve;
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "issue-token" => {
                let subject = args.next().context("issue-token needs a subject")?;
                command = Command::IssueToken(subject);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok((command, config_path))
}

fn issue_token(config: &ApiConfig, subject: &str) -> anyhow::Result<()> {
    let jwt = ward_api::auth::JwtManager::new(&config.auth.jwt_secret, config.auth.token_lifetime_secs);
    let token = jwt.issue_token(subject, &[ward_core::ADMIN_ROLE])?;
    println!("{}", token);
    Ok(())
}

async fn serve(config: ApiConfig) -> anyhow::Result<()> {
    info!("Starting Ward API server...");

    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;
    info!(path = %config.database.path.display(), "Database ready");

    let state = AppState::new(db.clone(), &config);
    let app = router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
