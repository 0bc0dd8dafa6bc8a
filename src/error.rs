//! Request-level error taxonomy and axum integration.
//!
//! Client input errors become plain-text 4xx responses carrying a
//! user-facing message. Internal faults are logged and turned into a
//! redirect to the landing page so a single request can never take the
//! server down.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::persistence::PersistenceError;
use crate::store::StoreLockError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Lock(#[from] StoreLockError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) | AppError::Lock(_) | AppError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for faults that are recovered by redirecting home.
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("Recovered from internal fault: {}", self);
            return Redirect::to("/").into_response();
        }
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}
