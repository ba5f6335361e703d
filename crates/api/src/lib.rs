//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes over the report engine
//! - The snapshot loading collaborator
//! - The auto-refresh worker
//! - JSON error responses

pub mod error;
pub mod refresh;
pub mod routes;
pub mod snapshot;

use std::sync::Arc;

use axum::Router;
use shelfwise_core::reports::ReportAssembler;
use shelfwise_shared::AnalyticsConfig;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::refresh::LatestReport;
use crate::snapshot::SnapshotSource;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where snapshots come from.
    pub source: Arc<dyn SnapshotSource>,
    /// Report engine.
    pub assembler: Arc<ReportAssembler>,
    /// Analytics settings (default page size and the like).
    pub analytics: Arc<AnalyticsConfig>,
    /// Most recent auto-refreshed report.
    pub latest: Arc<RwLock<Option<LatestReport>>>,
}

impl AppState {
    /// Creates state around a snapshot source.
    pub fn new(source: Arc<dyn SnapshotSource>, analytics: AnalyticsConfig) -> Self {
        Self {
            source,
            assembler: Arc::new(ReportAssembler::new(&analytics)),
            analytics: Arc::new(analytics),
            latest: Arc::new(RwLock::new(None)),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
