use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hotelier_core::error::CoreError;
use hotelier_reconcile::SchedulerError;
use hotelier_tenancy::TenancyError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the form `{"error": <message>, "code": <CODE>}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `hotelier_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Tenant resolution failed.
    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    /// The reconciliation scheduler refused the request.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A tenant-scoped route was called on the main domain.
    #[error("No tenant in request")]
    NoTenant,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::InvariantViolation(msg)) => internal(msg),

            // --- Tenant resolution ---
            AppError::Tenancy(TenancyError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "TENANT_NOT_FOUND",
                format!("Hotel '{id}' not found"),
            ),
            AppError::Tenancy(TenancyError::Unavailable(msg)) => unavailable(msg),
            AppError::NoTenant => (
                StatusCode::NOT_FOUND,
                "TENANT_NOT_FOUND",
                "No hotel could be determined from the request host".to_string(),
            ),

            // --- Scheduler ---
            AppError::Scheduler(err @ SchedulerError::TaskBusy(_)) => {
                (StatusCode::CONFLICT, "TASK_BUSY", err.to_string())
            }
            AppError::Scheduler(err @ SchedulerError::ShutDown) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                err.to_string(),
            ),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 503 with the cause logged; the response does not reveal connection details.
fn unavailable(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Dependency unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "SERVICE_UNAVAILABLE",
        "Service temporarily unavailable".to_string(),
    )
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
