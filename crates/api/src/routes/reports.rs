//! Report routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shelfwise_core::metrics::TagShare;
use shelfwise_core::reports::{Report, ReportError, ReportRequest, ReportType};
use shelfwise_core::table::{SortDirection, SortSpec};
use shelfwise_shared::AppError;
use shelfwise_shared::types::PageRequest;
use tracing::{error, info};

use crate::AppState;
use crate::error::ApiError;
use crate::refresh::LatestReport;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/latest", get(get_latest_report))
        .route("/reports/{report_type}", get(get_report))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters shared by every report type.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Reference instant (defaults to now).
    pub as_of: Option<DateTime<Utc>>,
    /// Selected month, `YYYY-MM`.
    pub month: Option<String>,
    /// Start of the inclusive date range.
    pub start: Option<NaiveDate>,
    /// End of the inclusive date range.
    pub end: Option<NaiveDate>,
    /// Category filter.
    pub category: Option<String>,
    /// Class filter.
    pub class: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
    /// Left side of a comparison.
    pub left: Option<String>,
    /// Right side of a comparison.
    pub right: Option<String>,
    /// Sort field for tables.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub direction: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// How tag shares are measured.
    pub tag_share: Option<TagShare>,
}

impl ReportQuery {
    /// Turns query parameters into an engine request.
    ///
    /// # Errors
    ///
    /// Returns a `ReportError` for malformed or half-given parameters.
    pub fn into_request(
        self,
        report_type: ReportType,
        now: DateTime<Utc>,
        default_page_size: u32,
    ) -> Result<ReportRequest, ReportError> {
        let mut request = ReportRequest::new(report_type, self.as_of.unwrap_or(now));

        request.month = self
            .month
            .as_deref()
            .map(ReportRequest::month_of)
            .transpose()?;
        request.date_range = match (self.start, self.end) {
            (Some(start), Some(end)) => Some(ReportRequest::date_range_of(start, end)?),
            (None, None) => None,
            (Some(_), None) => return Err(ReportError::MissingParameter("end")),
            (None, Some(_)) => return Err(ReportError::MissingParameter("start")),
        };
        request.sort = match self.sort {
            Some(key) => {
                let direction = match self.direction.as_deref() {
                    Some(raw) => SortDirection::parse(raw)
                        .ok_or_else(|| ReportError::InvalidSortDirection(raw.to_string()))?,
                    None => SortDirection::default(),
                };
                Some(SortSpec::new(key, direction))
            }
            None => None,
        };
        request.page = Some(PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(default_page_size),
        ));
        request.category = non_blank(self.category);
        request.class = non_blank(self.class);
        request.search = non_blank(self.search);
        request.left = non_blank(self.left);
        request.right = non_blank(self.right);
        request.tag_share = self.tag_share.unwrap_or_default();
        Ok(request)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, ApiError> {
    let report_type: ReportType = report_type.parse()?;
    let request = query.into_request(report_type, Utc::now(), state.analytics.default_page_size)?;

    let snapshot = state.source.load().await.inspect_err(|e| {
        error!(error = %e, report_type = %report_type, "Failed to load snapshot");
    })?;
    let report = state.assembler.assemble(&snapshot, &request)?;

    info!(
        report_type = %report_type,
        dropped = report.metadata.dropped,
        "Report assembled"
    );
    Ok(Json(report))
}

async fn get_latest_report(State(state): State<AppState>) -> Result<Json<LatestReport>, ApiError> {
    let latest = state.latest.read().await;
    latest
        .clone()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No refreshed report yet".to_string()).into())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_query_defaults() {
        let request = ReportQuery::default()
            .into_request(ReportType::Transactions, as_of(), 25)
            .unwrap();

        assert_eq!(request.as_of, as_of());
        assert_eq!(request.page, Some(PageRequest::new(1, 25)));
        assert_eq!(request.sort, None);
        assert_eq!(request.tag_share, TagShare::OfOccurrences);
    }

    #[test]
    fn test_query_sort_and_range() {
        let query = ReportQuery {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 3, 31),
            sort: Some("amount".into()),
            direction: Some("DESC".into()),
            search: Some("  ".into()),
            ..ReportQuery::default()
        };

        let request = query
            .into_request(ReportType::Transactions, as_of(), 10)
            .unwrap();

        assert_eq!(request.sort, Some(SortSpec::new("amount", SortDirection::Desc)));
        assert!(request.date_range.is_some());
        assert_eq!(request.search, None);
    }

    #[rstest]
    #[case::half_range(ReportQuery { start: NaiveDate::from_ymd_opt(2024, 1, 1), ..ReportQuery::default() }, ReportError::MissingParameter("end"))]
    #[case::bad_direction(ReportQuery { sort: Some("date".into()), direction: Some("up".into()), ..ReportQuery::default() }, ReportError::InvalidSortDirection("up".into()))]
    #[case::bad_month(ReportQuery { month: Some("2024-13".into()), ..ReportQuery::default() }, ReportError::InvalidMonth("2024-13".into()))]
    fn test_query_rejects(#[case] query: ReportQuery, #[case] expected: ReportError) {
        let error = query
            .into_request(ReportType::Transactions, as_of(), 10)
            .unwrap_err();
        assert_eq!(error, expected);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let query = ReportQuery {
            start: NaiveDate::from_ymd_opt(2024, 5, 1),
            end: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..ReportQuery::default()
        };
        let error = query
            .into_request(ReportType::Overview, as_of(), 10)
            .unwrap_err();
        assert!(matches!(error, ReportError::InvalidDateRange { .. }));
    }
}

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use shelfwise_core::events::{RawTransaction, Snapshot};
    use shelfwise_shared::AnalyticsConfig;
    use tower::ServiceExt;

    use crate::create_router;
    use crate::refresh::refresh_once;
    use crate::snapshot::{InMemorySource, SnapshotError, SnapshotSource};

    use super::*;

    struct DownSource;

    #[async_trait]
    impl SnapshotSource for DownSource {
        async fn load(&self) -> Result<Snapshot, SnapshotError> {
            Err(SnapshotError::Unavailable("timeout".into()))
        }
    }

    fn transaction(id: &str, kind: &str, amount: u32, date: &str, description: &str) -> RawTransaction {
        RawTransaction {
            id: id.into(),
            transaction_type: Some(kind.into()),
            amount: Some(amount.into()),
            category: Some("Kitap".into()),
            description: Some(description.into()),
            date: Some(json!(date)),
            campus_id: None,
        }
    }

    fn create_test_state() -> AppState {
        let snapshot = Snapshot {
            transactions: vec![
                transaction("t1", "income", 500, "2024-05-02T09:00:00Z", "Veli bağışı"),
                transaction("t2", "expense", 120, "2024-05-10T09:00:00Z", "Kitap alımı"),
                transaction("t3", "expense", 80, "2024-06-01T09:00:00Z", "Kırtasiye"),
            ],
            ..Snapshot::default()
        };
        AppState::new(
            Arc::new(InMemorySource::new(snapshot)),
            AnalyticsConfig::default(),
        )
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(create_test_state(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_budget_summary() {
        let (status, body) = get(
            create_test_state(),
            "/api/v1/reports/budget_summary?as_of=2024-06-15T12:00:00Z",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reportType"], "budget_summary");
        assert_eq!(body["data"]["totalIncome"], "500");
        assert_eq!(body["data"]["totalExpense"], "200");
        assert_eq!(body["data"]["netBalance"], "300");
    }

    #[tokio::test]
    async fn test_transactions_page() {
        let (status, body) = get(
            create_test_state(),
            "/api/v1/reports/transactions?as_of=2024-06-15T12:00:00Z&sort=amount&direction=asc&per_page=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["meta"]["total"], 3);
        assert_eq!(body["data"]["meta"]["total_pages"], 2);
        assert_eq!(body["data"]["data"][0]["id"], "t3");
        assert_eq!(body["data"]["data"][1]["id"], "t2");
    }

    #[tokio::test]
    async fn test_unknown_report_type() {
        let (status, body) = get(create_test_state(), "/api/v1/reports/nonsense").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_page_zero() {
        let (status, _) = get(create_test_state(), "/api/v1/reports/transactions?page=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_bad_gateway() {
        let state = AppState::new(Arc::new(DownSource), AnalyticsConfig::default());
        let (status, body) = get(state, "/api/v1/reports/overview").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "EXTERNAL_SERVICE_ERROR");
    }

    #[tokio::test]
    async fn test_latest_report() {
        let state = create_test_state();
        let (status, _) = get(state.clone(), "/api/v1/reports/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        refresh_once(&state, ReportType::BudgetSummary).await.unwrap();

        let (status, body) = get(state, "/api/v1/reports/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["reportType"], "budget_summary");
        assert!(body["changes"].as_array().unwrap().is_empty());
    }
}
