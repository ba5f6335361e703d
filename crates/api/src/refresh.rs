//! Periodic re-fetch and recompute of one report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shelfwise_core::refresh::{DataChange, detect_changes};
use shelfwise_core::reports::{Report, ReportRequest, ReportType};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;

/// The most recent refreshed report and what moved since the run before it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReport {
    /// Report of the latest successful run.
    pub report: Report,
    /// Values that changed against the previous successful run.
    pub changes: Vec<DataChange>,
    /// When the run finished.
    pub refreshed_at: DateTime<Utc>,
}

/// Loads a fresh snapshot, rebuilds `report_type` and replaces the latest slot.
///
/// On failure the previous report stays in place.
///
/// # Errors
///
/// Returns the load or assembly error of this run.
pub async fn refresh_once(state: &AppState, report_type: ReportType) -> Result<(), ApiError> {
    let snapshot = state.source.load().await?;

    let now = Utc::now();
    let request = ReportRequest::new(report_type, now);
    let report = state.assembler.assemble(&snapshot, &request)?;

    let mut latest = state.latest.write().await;
    let changes = latest
        .as_ref()
        .map(|previous| detect_changes(&previous.report, &report))
        .unwrap_or_default();

    info!(
        report_type = %report_type,
        changes = changes.len(),
        "Report refreshed"
    );
    *latest = Some(LatestReport {
        report,
        changes,
        refreshed_at: now,
    });
    Ok(())
}

/// Background worker rebuilding one report on a fixed interval.
#[derive(Debug, Clone)]
pub struct AutoRefresher {
    report_type: ReportType,
    interval: Duration,
    cancel: CancellationToken,
}

impl AutoRefresher {
    /// Creates a refresher; it stops once `cancel` is cancelled.
    #[must_use]
    pub const fn new(report_type: ReportType, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            report_type,
            interval,
            cancel,
        }
    }

    /// Runs until cancelled. The first run happens immediately.
    pub async fn run(self, state: AppState) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!(report_type = %self.report_type, "Auto-refresh stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(ApiError(e)) = refresh_once(&state, self.report_type).await {
                        warn!(
                            error = %e,
                            report_type = %self.report_type,
                            "Refresh failed, keeping previous report"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use shelfwise_core::events::{RawUser, Snapshot};
    use shelfwise_shared::AnalyticsConfig;

    use super::*;
    use crate::snapshot::{InMemorySource, SnapshotError, SnapshotSource};

    /// Serves one snapshot until switched off, then fails.
    struct FlakySource {
        snapshot: Snapshot,
        up: AtomicBool,
    }

    #[async_trait]
    impl SnapshotSource for FlakySource {
        async fn load(&self) -> Result<Snapshot, SnapshotError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(self.snapshot.clone())
            } else {
                Err(SnapshotError::Unavailable("connection refused".into()))
            }
        }
    }

    fn users(count: usize) -> Snapshot {
        Snapshot {
            users: (0..count)
                .map(|i| RawUser {
                    id: format!("u{i}"),
                    created_at: Some(serde_json::json!(Utc::now().to_rfc3339())),
                    ..RawUser::default()
                })
                .collect(),
            ..Snapshot::default()
        }
    }

    #[tokio::test]
    async fn test_refresh_once_fills_latest() {
        let state = AppState::new(
            Arc::new(InMemorySource::new(users(2))),
            AnalyticsConfig::default(),
        );

        refresh_once(&state, ReportType::UserRegistrations)
            .await
            .unwrap();

        let latest = state.latest.read().await;
        let latest = latest.as_ref().unwrap();
        assert_eq!(latest.report.report_type, ReportType::UserRegistrations);
        assert!(latest.changes.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_report() {
        let source = Arc::new(FlakySource {
            snapshot: users(1),
            up: AtomicBool::new(true),
        });
        let state = AppState::new(source.clone(), AnalyticsConfig::default());

        refresh_once(&state, ReportType::Overview).await.unwrap();
        let before = state.latest.read().await.as_ref().unwrap().refreshed_at;

        source.up.store(false, Ordering::SeqCst);
        let result = refresh_once(&state, ReportType::Overview).await;

        assert!(result.is_err());
        let after = state.latest.read().await.as_ref().unwrap().refreshed_at;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_second_run_reports_changes() {
        let source = Arc::new(FlakySource {
            snapshot: users(1),
            up: AtomicBool::new(true),
        });
        let state = AppState::new(source, AnalyticsConfig::default());
        refresh_once(&state, ReportType::Overview).await.unwrap();

        let grown = AppState {
            source: Arc::new(InMemorySource::new(users(3))),
            ..state.clone()
        };
        refresh_once(&grown, ReportType::Overview).await.unwrap();

        let latest = state.latest.read().await;
        assert!(!latest.as_ref().unwrap().changes.is_empty());
    }

    #[tokio::test]
    async fn test_auto_refresher_stops_on_cancel() {
        let state = AppState::new(
            Arc::new(InMemorySource::new(users(1))),
            AnalyticsConfig::default(),
        );
        let cancel = CancellationToken::new();
        let refresher =
            AutoRefresher::new(ReportType::Overview, Duration::from_secs(3600), cancel.clone());

        let handle = tokio::spawn(refresher.run(state.clone()));
        // The first tick fires immediately.
        for _ in 0..50 {
            if state.latest.read().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(state.latest.read().await.is_some());
    }
}
