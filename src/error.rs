use std::fmt::Debug;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Unauthorized")]
  Unauthorized,

  #[error("Forbidden")]
  Forbidden,

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("Invalid arguments: {0}")]
  InvalidArgs(String),

  #[error("Cannot move from {from} to {to}")]
  InvalidTransition { from: String, to: String },

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment error: {0}")]
  Payment(String),

  #[error("External service error: {0}")]
  External(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn transition(from: impl Debug, to: impl Debug) -> Self {
    Self::InvalidTransition {
      from: format!("{from:?}").to_uppercase(),
      to: format!("{to:?}").to_uppercase(),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Database(_) | Error::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::InvalidArgs(_) => StatusCode::BAD_REQUEST,
      Error::InvalidTransition { .. } | Error::Conflict(_) => {
        StatusCode::CONFLICT
      }
      Error::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      Error::External(_) => StatusCode::BAD_GATEWAY,
    };

    // internals stay in the log
    let message = match &self {
      Error::Database(err) => {
        tracing::error!("Database error: {err}");
        "Database error".to_string()
      }
      Error::Internal(err) => {
        tracing::error!("Internal error: {err}");
        "Internal error".to_string()
      }
      other => other.to_string(),
    };

    let body = json::json!({
      "success": false,
      "error": message
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
