//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use budgetdesk_domain::error::AppError;
use budgetdesk_domain::validation::{ValidationErrors, ValidationFailure};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<ValidationFailure>,
}

/// Maps [`AppError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self(AppError::Validation(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation failed".to_string(),
                    failures: errors.failures().to_vec(),
                },
            ),
            AppError::NotFound(err) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: err.to_string(),
                    failures: Vec::new(),
                },
            ),
            err @ (AppError::Storage(_) | AppError::NoHandler(_)) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal server error".to_string(),
                        failures: Vec::new(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
