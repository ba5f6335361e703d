//! Mapping of errors to JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use shelfwise_core::reports::ReportError;
use shelfwise_shared::AppError;

use crate::snapshot::SnapshotError;

/// An [`AppError`] on its way out as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string()
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<ReportError> for ApiError {
    fn from(error: ReportError) -> Self {
        Self(AppError::Validation(error.to_string()))
    }
}

impl From<SnapshotError> for ApiError {
    fn from(error: SnapshotError) -> Self {
        Self(AppError::ExternalService(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_errors_are_validation_errors() {
        let ApiError(error) = ApiError::from(ReportError::UnknownReportType("x".into()));
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_snapshot_errors_are_external() {
        let ApiError(error) = ApiError::from(SnapshotError::Unavailable("down".into()));
        assert_eq!(error.status_code(), 502);
    }

    #[test]
    fn test_response_status() {
        let response = ApiError(AppError::NotFound("nothing yet".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
