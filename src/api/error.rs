use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::CirculationError;

impl CirculationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CirculationError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CirculationError::Forbidden => StatusCode::FORBIDDEN,
            CirculationError::NotFound(_) => StatusCode::NOT_FOUND,
            CirculationError::Unavailable
            | CirculationError::AlreadyBorrowed
            | CirculationError::InvalidState(_)
            | CirculationError::Conflict(_) => StatusCode::CONFLICT,
            CirculationError::Validation(_) => StatusCode::BAD_REQUEST,
            CirculationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CirculationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let CirculationError::Store(msg) = &self {
            tracing::error!(error.message = %msg, "Unexpected store error");
        }

        (
            status,
            Json(json!({ "error": self.to_string(), "code": self.code() })),
        )
            .into_response()
    }
}
