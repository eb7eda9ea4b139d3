//! Maps workflow errors to HTTP responses.

use api_shared::{ErrorBody, ErrorRes};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use testreq_core::WorkflowError;

/// Handler error: a [`WorkflowError`] rendered as a JSON [`ErrorRes`].
#[derive(Debug)]
pub struct ApiError(pub WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str, Option<String>) {
        match &self.0 {
            WorkflowError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            WorkflowError::InvalidState { .. } | WorkflowError::IllegalTransition { .. } => {
                (StatusCode::CONFLICT, "invalid_state", None)
            }
            WorkflowError::Permission { .. } => (StatusCode::FORBIDDEN, "permission", None),
            WorkflowError::Validation { field, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation",
                Some(field.clone()),
            ),
            WorkflowError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated", None),
            WorkflowError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input", None),
            WorkflowError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, field) = self.classify();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {:?}", self.0);
            "Internal error".to_string()
        } else {
            tracing::debug!("request rejected: {}", self.0);
            self.0.to_string()
        };

        let body = ErrorRes {
            error: ErrorBody {
                code: status.as_u16(),
                kind: kind.into(),
                message,
                field,
            },
        };
        (status, Json(body)).into_response()
    }
}
