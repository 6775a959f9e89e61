use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleetstat_domain::DomainError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}

/// Wraps a payload in the success envelope.
pub fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// Maps a domain error to the error envelope with a stable code.
pub fn domain_error(err: &DomainError) -> Response {
    let (status, code) = match err {
        DomainError::StatusNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::DirectoryFetchFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "API_ERROR"),
        DomainError::RepositoryError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR"),
        DomainError::CacheUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REPORT_ERROR"),
        DomainError::InvalidStatusTopic(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    (
        status,
        Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                message: err.to_string(),
                code: code.to_string(),
            },
        }),
    )
        .into_response()
}
