//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use webside_engine::memory::ImageError;
use webside_engine::ReflectError;

use crate::config::ConfigError;

/// A failed request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 400 with a text reason
    #[error("{0}")]
    BadRequest(String),

    /// 500; the server shuts down after answering
    #[error("{0}")]
    Fatal(String),
}

impl ApiError {
    /// HTTP status of the error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReflectError> for ApiError {
    fn from(err: ReflectError) -> Self {
        match err {
            ReflectError::NotFound(_) | ReflectError::OutOfRange { .. } => {
                ApiError::NotFound(err.to_string())
            }
            ReflectError::BadRequest(reason) => ApiError::BadRequest(reason),
            ReflectError::Fatal(_) => ApiError::Fatal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, self.to_string()).into_response()
    }
}

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The runtime image could not be built
    #[error("Failed to build image: {0}")]
    Image(#[from] ImageError),

    /// The start-up objects could not be pinned
    #[error("Failed to pin sample objects: {0}")]
    Pin(#[from] ReflectError),

    /// Binding or serving failed
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request hit an unrecoverable runtime state
    #[error("Stopped after fatal error: {0}")]
    Fatal(String),
}
