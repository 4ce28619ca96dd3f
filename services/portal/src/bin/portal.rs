//! services/portal/src/bin/portal.rs

use portal_lib::{
    adapters::HttpBackend,
    config::Config,
    console,
    dashboard::{DashboardSettings, PortalServices},
    error::AppError,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        // stdout belongs to the console view
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.api_base_url);

    // --- 2. Initialize the Backend Adapter ---
    let backend = Arc::new(HttpBackend::from_config(&config)?);
    let services = PortalServices::from_backend(backend);
    let settings = DashboardSettings::from_config(&config);

    // --- 3. Run the Console ---
    console::run(services, settings).await?;
    info!("Portal closed.");
    Ok(())
}
