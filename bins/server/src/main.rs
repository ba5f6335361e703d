//! Shelfwise API Server
//!
//! Main entry point for the Shelfwise reporting service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfwise_api::refresh::AutoRefresher;
use shelfwise_api::snapshot::JsonFileSource;
use shelfwise_api::{AppState, create_router};
use shelfwise_core::reports::ReportType;
use shelfwise_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfwise=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    let source = JsonFileSource::new(&config.snapshot.path, config.snapshot.campus_id.clone());
    info!(
        path = %config.snapshot.path,
        campus = config.snapshot.campus_id.as_deref().unwrap_or("all"),
        timezone = %config.analytics.timezone,
        "Snapshot source configured"
    );

    // Create application state
    let state = AppState::new(Arc::new(source), config.analytics.clone());
    let shutdown = CancellationToken::new();

    // Start auto-refresh
    if config.refresh.enabled {
        let report_type: ReportType = config.refresh.report_type.parse()?;
        let refresher = AutoRefresher::new(
            report_type,
            Duration::from_secs(config.refresh.interval_secs.max(1)),
            shutdown.child_token(),
        );
        tokio::spawn(refresher.run(state.clone()));
        info!(
            report_type = %report_type,
            interval_secs = config.refresh.interval_secs,
            "Auto-refresh enabled"
        );
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
