mod api;
mod config;
mod logging;
mod services;

use color_eyre::Result;
use domain::core::PortfolioManager;
use domain::store::Stores;
use domain::suggestion::SuggestionEngine;

use crate::api::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::services::AppHandle;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = AppConfig::from_env()?;
    logging::init(&config.log_level)?;
    tracing::info!("Starting portfolio manager");
    tracing::debug!("Configuration: {config:?}");

    if config.uses_dev_secret() {
        tracing::warn!("Using the development JWT secret, set PORTFOLIO_MANAGER_JWT_SECRET");
    }

    let stores = if let Some(url) = &config.database_url {
        tracing::info!("Using Postgres storage");
        Stores::postgres(url).await?
    } else {
        tracing::warn!("DATABASE_URL is not set, data is kept in memory");
        Stores::in_memory()
    };

    let engine = SuggestionEngine::new(config.suggestion_policy);
    let manager = match config.suggestion_seed {
        Some(seed) => PortfolioManager::with_seed(stores, engine, seed),
        None => PortfolioManager::new(stores, engine),
    };

    if config.seed_demo {
        let demo_user = manager.seed_demo_data().await?;
        tracing::info!(%demo_user, "Demo account ready");
    }

    let jwt = JwtKeys::new(
        config.jwt_secret.as_bytes(),
        chrono::Duration::hours(config.token_ttl_hours),
    );
    let app = api::create_api(AppHandle::new(manager, jwt));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("API documentation at http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
