use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod assembly;
mod error;
mod middleware;
mod models;
mod repositories;
mod resources;
mod routes;
mod settings;
mod state;

use common::database::{health_check, init_pool};
use tokio::net::TcpListener;

use crate::{
    middleware::Authenticator,
    repositories::{DataSource, fixture::FixtureSource, postgres::PgDataSource},
    settings::Settings,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting feed service");

    let settings = Settings::load()?;

    let source: Arc<dyn DataSource> = if settings.database.use_db {
        let pool = init_pool(&settings.database).await?;

        if health_check(&pool).await? {
            info!("Database connection successful");
        } else {
            anyhow::bail!("Failed to connect to database");
        }

        Arc::new(PgDataSource::new(pool, settings.database.query_timeout()))
    } else {
        info!(
            "Serving fixtures from {}",
            settings.paths.data_dir.display()
        );
        Arc::new(FixtureSource::new(settings.paths.data_dir.clone()))
    };

    let auth = Authenticator::from_settings(&settings.auth).map_err(anyhow::Error::msg)?;
    if settings.auth.default_user_uid.is_none() && settings.auth.jwt_public_key.is_none() {
        warn!("No default user or token key configured, user routes will answer 401");
    }

    let app = routes::create_router(AppState::new(source, auth), &settings.paths.file_dir);

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Feed service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down feed service");
        })
        .await?;

    Ok(())
}
