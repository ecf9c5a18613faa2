//! HTTP front end for the consultation pipeline and its records.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod storage;
pub mod telemetry;
pub mod validation;

use axum::Router;
use consilium::ConsultationService;
use std::sync::Arc;
use tracing::{error, info};

pub use config::{AiProvider, ServiceConfig};
pub use routes::build_router;
use storage::{InMemoryStorage, PostgresStorage, Storage};

#[derive(Clone)]
pub struct AppState {
    pub consultation: ConsultationService,
    pub storage: Arc<dyn Storage>,
}

pub async fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let gateway = config.build_gateway()?;
    info!(
        provider = %gateway.provider(),
        model = %gateway.default_model(),
        "AI gateway configured"
    );

    let app_state = AppState {
        consultation: ConsultationService::new(gateway),
        storage: create_storage(config).await,
    };
    Ok(build_router(app_state))
}

/// PostgreSQL when `DATABASE_URL` is set and reachable, in-memory otherwise.
async fn create_storage(config: &ServiceConfig) -> Arc<dyn Storage> {
    match &config.database_url {
        Some(database_url) => {
            info!("Using PostgreSQL storage");
            match PostgresStorage::connect(database_url).await {
                Ok(storage) => Arc::new(storage),
                Err(e) => {
                    error!(
                        "Failed to connect to PostgreSQL: {}. Falling back to in-memory storage.",
                        e
                    );
                    Arc::new(InMemoryStorage::new())
                }
            }
        }
        None => {
            info!("Using in-memory storage (set DATABASE_URL to use PostgreSQL)");
            Arc::new(InMemoryStorage::new())
        }
    }
}
