use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::{ErrorKind, ServiceError};

/// Transport rendering of a [`ServiceError`]: one status-code mapping and
/// one JSON body shape for every handler. The originating-component label
/// stays in the logs; clients only see kind and message.
#[derive(Debug)]
pub struct ApiError(ServiceError);

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.0.kind().as_str(),
                message: self.0.message().to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
