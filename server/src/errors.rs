// techlab_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use techlab_core::FlowError;
use thiserror::Error;
use uuid::Uuid;

/// One rejected form field, rendered in `{errors: [...]}` bodies.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
  pub field: String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &str, message: impl Into<String>) -> Self {
    Self {
      field: field.to_string(),
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Validation Error: {} invalid field(s)", .0.len())]
  FieldErrors(Vec<FieldError>),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Invalid State: {0}")]
  InvalidState(String),

  #[error("Insufficient stock for product {product_name} ({product_id})")]
  InsufficientStock { product_id: Uuid, product_name: String },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(sqlx::Error),

  #[error("Object Storage Error: {0}")]
  Storage(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A pipeline stopped without producing the result the handler needed.
  #[error("Pipeline execution was halted by a handler.")]
  PipelineHalted,
}

impl From<sqlx::Error> for AppError {
  fn from(err: sqlx::Error) -> Self {
    match &err {
      sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
        AppError::Conflict("El recurso ya existe.".to_string())
      }
      sqlx::Error::RowNotFound => AppError::NotFound("Recurso no encontrado".to_string()),
      _ => AppError::Sqlx(err),
    }
  }
}

impl AppError {
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::Unauthorized(m)
      | AppError::Forbidden(m)
      | AppError::InvalidState(m) => m.clone(),
      AppError::FieldErrors(_) => "Datos inválidos.".to_string(),
      AppError::InsufficientStock { product_name, .. } => {
        format!("Stock insuficiente para el producto: {}", product_name)
      }
      _ => "Error interno del servidor.".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_)
      | AppError::FieldErrors(_)
      | AppError::Conflict(_)
      | AppError::InvalidState(_)
      | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Storage(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_)
      | AppError::PipelineHalted => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Rejecting request");
    }

    let message = self.public_message();
    let body = match self {
      AppError::FieldErrors(errors) => json!({ "message": message, "errors": errors }),
      AppError::InsufficientStock { product_id, .. } => json!({ "message": message, "productId": product_id }),
      _ => json!({ "message": message }),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
