use rust_chartscope::api::{run_server, AppState};
use rust_chartscope::config::AppConfig;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Setup Logging (RUST_LOG wins over the configured level)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting ChartScope...");
    info!(
        "Page size: {}, locate radius: {}, marker offset: {}",
        config.chart.page_size, config.chart.locate_radius, config.chart.marker_offset
    );

    let app_state = Arc::new(AppState::new(config));

    info!("Initializing API Server...");
    run_server(app_state).await?;

    Ok(())
}
