mod analytics;
mod auth;
mod calls;
mod config;
mod db_types;
mod error;
mod handlers;
mod loads;
mod query;
mod rate_limit;
mod routes;
mod store;
mod types;
mod validation;

use crate::config::{Config, ConfigError};
use crate::store::PgStore;
use crate::types::AppState;
use crate::validation::ValidationRules;

use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;

pub mod consts {
    pub const API_KEY_HEADER: &str = "x-api-key";
    pub const MIN_ACTIVE_FILTERS: usize = 2;
    pub const MIN_CITY_LEN: usize = 2;
    pub const MAX_CITY_LEN: usize = 100;
    pub const DEFAULT_PAGE_LIMIT: u32 = 50;
    pub const MAX_PAGE_LIMIT: u32 = 100;
    pub const MAX_MONTH_GROUPS: usize = 12;
    pub const MAX_CARRIER_GROUPS: usize = 10;
    pub const RATE_LIMIT_MAX_REQUESTS: u32 = 1000;
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("server error: {0}")]
    Server(#[from] hyper::Error),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn init_tracing(log_level: Option<&str>) -> Result<(), StartupError> {
    let crate_level = log_level
        .and_then(|l| LevelFilter::from_str(l).ok())
        .unwrap_or(LevelFilter::DEBUG);
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            Targets::new()
                .with_default(LevelFilter::INFO)
                .with_targets([("hyper", LevelFilter::OFF), ("loadboard_rs", crate_level)]),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    init_tracing(config.log_level.as_deref())?;

    if config.api_key.is_none() {
        warn!("API_KEY not set; every /api request will fail with 500");
    }

    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&db_pool).await?;
    info!("database migrations applied");

    let store = Arc::new(PgStore::new(db_pool));
    let app_state = Arc::new(AppState {
        api_key: config.api_key,
        rules: ValidationRules::default(),
        loads: store.clone(),
        calls: store,
        limiter: config.rate_limit.limiter(),
    });

    let app = routes::router(app_state, config.cors_origin);

    info!(
        addr=%config.bind_addr,
        max_requests=%config.rate_limit.max_requests,
        window=?config.rate_limit.window,
        "listening"
    );
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;
    Ok(())
}
