//! Produce Trade Ledger - Backend
//!
//! Storage and service layer for a produce trading operation: purchase and
//! sales invoices, inventory, payments, expenses, damages, packaging costs,
//! and the report aggregates derived from them. This crate is a library;
//! the web presentation layer builds an [`AppState`] once at process start
//! and calls the services from its request handlers.

use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Application state shared with the presentation layer
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Load configuration, connect the pool, and (in development) run
    /// migrations. Called once at process start.
    pub async fn initialize() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Config::load()?;

        tracing::info!("Starting Produce Trade Ledger");
        tracing::info!("Environment: {}", config.environment);

        tracing::info!("Connecting to database...");
        let db = connect_pool(&config).await?;
        tracing::info!("Database connection established");

        if config.environment == "development" {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&db).await?;
            tracing::info!("Migrations completed");
        }

        Ok(Self {
            db,
            config: Arc::new(config),
        })
    }

    pub fn inventory(&self) -> services::InventoryService {
        services::InventoryService::new(self.db.clone())
    }

    pub fn parties(&self) -> services::PartyService {
        services::PartyService::new(self.db.clone())
    }

    pub fn purchases(&self) -> services::PurchaseService {
        services::PurchaseService::new(self.db.clone(), self.config.ledger.clone())
    }

    pub fn sales(&self) -> services::SalesService {
        services::SalesService::new(self.db.clone(), self.config.ledger.clone())
    }

    pub fn payments(&self) -> services::PaymentService {
        services::PaymentService::new(self.db.clone())
    }

    pub fn expenses(&self) -> services::ExpenseService {
        services::ExpenseService::new(self.db.clone())
    }

    pub fn reporting(&self) -> services::ReportingService {
        services::ReportingService::new(self.db.clone())
    }
}

/// Initialize the tracing subscriber. Call once, before [`AppState::initialize`].
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "produce_ledger_backend=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Create the database connection pool
pub async fn connect_pool(config: &Config) -> Result<sqlx::PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await
}
