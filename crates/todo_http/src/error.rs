use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use todo_core::AppError;
use tracing::error;

/// An [`AppError`] on its way out as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotSupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidData(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_storage() {
            error!(code = self.0.code(), error = %self.0.message(), "storage failure");
            "Internal Server Error"
        } else {
            self.0.message()
        };
        let body = Json(json!({
            "message": message,
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}
