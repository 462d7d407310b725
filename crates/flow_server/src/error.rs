//! Server errors.
//!
//! [`ServerError`] covers startup; [`ApiError`] is what handlers return and
//! turns into an HTTP response.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flow_core::{ErrorKind, ServiceError};
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("Database error")]
    #[diagnostic(
        code(flow_server::database),
        help("Check that the database URL is correct and the file is writable")
    )]
    Database(#[from] flow_db::DbError),

    #[error("Failed to set up OAuth2 clients")]
    #[diagnostic(code(flow_server::oauth2))]
    Provider(#[from] flow_core::ProviderError),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(flow_server::config))]
    Config(String),

    #[error("IO error")]
    #[diagnostic(code(flow_server::io))]
    Io(#[from] std::io::Error),
}

/// Error returned from handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Body was not JSON or did not match the expected shape
    #[error("{}", .0.body_text())]
    Json(#[from] JsonRejection),

    #[error("missing bearer token")]
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Json(rejection) => rejection.status(),
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::Service(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::AuthFailure => match err {
                    ServiceError::WrongPassword => StatusCode::FORBIDDEN,
                    _ => StatusCode::UNAUTHORIZED,
                },
                ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
