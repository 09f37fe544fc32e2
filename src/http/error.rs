//! Error responses for the HTTP API.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::ip::IpamError;

/// Failures surfaced by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ipam(#[from] IpamError),

    /// The request could not be extracted (bad JSON, missing query field, ...)
    #[error("rejected request: {message}")]
    Rejection { status: StatusCode, message: String },

    /// The blocking worker running the operation panicked or was cancelled
    #[error("operation did not complete: {0}")]
    Worker(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejection {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejection {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejection {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Unknown subnet or allocation: 404 Not Found
    /// - Existing subnet, bad address or range, exhausted pool: 400 Bad Request
    /// - Storage and worker failures: 500 Internal Server Error
    /// - Rejected requests keep the extractor's status (400, 415, 422)
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejection { status, .. } => *status,
            Self::Ipam(IpamError::SubnetNotFound { .. } | IpamError::AllocationNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::Ipam(
                IpamError::SubnetAlreadyExists { .. }
                | IpamError::InvalidAddress(_)
                | IpamError::InvalidRange { .. }
                | IpamError::PoolExhausted { .. },
            ) => StatusCode::BAD_REQUEST,
            Self::Ipam(IpamError::Storage(_)) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message for the `detail` field of the response body
    pub fn detail(&self) -> String {
        match self {
            Self::Ipam(IpamError::SubnetNotFound { .. }) => "Subnet not found".to_string(),
            Self::Ipam(IpamError::SubnetAlreadyExists { .. }) => "Subnet already exists".to_string(),
            Self::Ipam(IpamError::InvalidAddress(e)) => format!("Invalid IP address: {}", e),
            Self::Ipam(IpamError::InvalidRange { .. }) => "Start IP cannot be greater than End IP".to_string(),
            Self::Ipam(IpamError::PoolExhausted { .. }) => "IP pool exhausted".to_string(),
            Self::Ipam(IpamError::AllocationNotFound { .. }) => "IP not found for this name".to_string(),
            // Storage paths and OS errors stay in the server log.
            Self::Ipam(IpamError::Storage(_)) => "Storage error".to_string(),
            Self::Rejection { message, .. } => message.clone(),
            Self::Worker(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
