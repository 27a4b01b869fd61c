use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stash_api::auth::{JwtService, JwtSettings, PasswordHasher, Sha256Hasher, TokenGenerator};
use stash_api::config::{self, AppConfig, Environment};
use stash_api::database::{Database, PgFolderStore, PgUserStore};
use stash_api::services::{AccountPolicy, AccountService};
use stash_api::{app, mail, AppState};

#[derive(Parser)]
#[command(name = "stash-api")]
#[command(about = "Account and folder API server")]
#[command(version)]
struct Args {
    #[arg(long, value_enum, help = "Environment defaults to start from (overrides APP_ENV)")]
    env: Option<Environment>,

    #[arg(long, help = "Port to listen on (overrides STASH_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Do not create missing tables at startup")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stash_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut startup = match args.env {
        Some(environment) => AppConfig::for_environment(environment),
        None => AppConfig::from_env(),
    };
    if let Some(port) = args.port {
        startup.server.port = port;
    }
    let config = config::init(startup);
    info!("Starting Stash API in {:?} mode", config.environment);

    let jwt_settings = JwtSettings::from_config(&config.security).context("invalid token lifetimes")?;
    let jwt = Arc::new(JwtService::new(jwt_settings).context("JWT_SECRET must be set")?);

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    if args.skip_migrations {
        info!("Skipping table creation");
    } else {
        db.migrate().await.context("failed to create tables")?;
    }

    let hasher: Arc<dyn PasswordHasher> = Arc::new(Sha256Hasher);
    let accounts = AccountService::new(
        Arc::new(PgUserStore::new(db.pool().clone())),
        mail::from_config(&config.mail),
        hasher.clone(),
        jwt.clone(),
        TokenGenerator::new(config.security.activation_token_length),
        AccountPolicy::from_config(&config.security, &config.mail),
    );

    let state = AppState {
        accounts: Arc::new(accounts),
        jwt,
        folders: Arc::new(PgFolderStore::new(db.pool().clone())),
        hasher,
        db: Some(db.clone()),
    };

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Stash API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, config.security.enable_cors))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
