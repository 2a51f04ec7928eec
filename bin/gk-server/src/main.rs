//! Gatekeeper Server
//!
//! Wires configuration, the core services and the HTTP adapter:
//! - `serve` (default) - run the API
//! - `hash-password` - print an Argon2id hash for a `[[users]]` entry
//! - `example-config` - print a documented configuration file

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use chrono::Duration;
use clap::{Parser, Subcommand};
use gk_config::{AppConfig, ConfigLoader};
use gk_core::{
    Argon2Config, Argon2CredentialVerifier, AuthService, InMemoryRefreshTokenStore,
    InMemoryUserDirectory, JwtTokenService, TokenServiceConfig, User,
};
use gk_http::{app_router, AuthState};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

/// How often expired refresh tokens are swept from the in-memory store
const PURGE_INTERVAL: StdDuration = StdDuration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "gk-server")]
#[command(about = "Gatekeeper - password login with rotating refresh tokens")]
struct Args {
    /// Configuration file (otherwise the standard search paths are used)
    #[arg(long, env = "GATEKEEPER_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Hash a password for use in a [[users]] entry
    HashPassword {
        password: String,
    },
    /// Print an example configuration file
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(args.config).await,
        Command::HashPassword { password } => {
            let verifier = Argon2CredentialVerifier::new(Argon2Config::default())?;
            println!("{}", verifier.hash_password(&password)?);
            Ok(())
        }
        Command::ExampleConfig => {
            print!("{}", AppConfig::example_toml());
            Ok(())
        }
    }
}

async fn serve(config_path: Option<String>) -> Result<()> {
    gk_common::logging::init_logging("gk-server");

    info!("Starting Gatekeeper Server");

    let loader = match config_path {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let access_ttl = Duration::try_seconds(config.jwt.access_token_expiry_secs)
        .context("jwt.access_token_expiry_secs out of range")?;
    let refresh_ttl = Duration::try_seconds(config.jwt.refresh_token_expiry_secs)
        .context("jwt.refresh_token_expiry_secs out of range")?;

    // Token service: a bad secret or lifetime is fatal here, never per request
    let token_service = Arc::new(
        JwtTokenService::new(
            TokenServiceConfig::new(config.jwt.secret.as_bytes())
                .with_access_ttl(access_ttl)
                .with_refresh_ttl(refresh_ttl),
        )
        .context("Failed to initialize token service")?,
    );

    let verifier = Arc::new(Argon2CredentialVerifier::new(Argon2Config::default())?);

    let users = Arc::new(InMemoryUserDirectory::new());
    for seed in &config.users {
        let user = User::new(
            seed.user_id.as_str(),
            seed.username.as_str(),
            seed.password_hash.as_str(),
            seed.roles.iter().cloned(),
        )
        .with_context(|| format!("Invalid user seed {:?}", seed.username))?;
        if users.insert(user).is_some() {
            warn!(username = %seed.username, "Duplicate username in [[users]], last entry wins");
        }
    }
    if users.is_empty() {
        warn!("No users configured; every login will fail");
    } else {
        info!(count = users.len(), "Seeded user directory");
    }

    let store = Arc::new(InMemoryRefreshTokenStore::new());

    let auth_service = Arc::new(AuthService::new(
        users,
        verifier,
        token_service.clone(),
        store.clone(),
        Some(refresh_ttl),
    ));

    let state = AuthState::from_config(auth_service, token_service, &config);
    let app = Router::new()
        .route("/health", get(health_handler))
        .merge(app_router(state, config.auth.endpoints_enabled));

    // Sweep refresh tokens nobody came back for
    let purge_store = store.clone();
    let purge_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            purge_store.purge_expired();
        }
    });

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    info!("Gatekeeper Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received...");
}
