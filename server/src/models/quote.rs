// techlab_server/src/models/quote.rs

use crate::errors::{AppError, FieldError, Result};
use crate::models::is_valid_email;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quote_status")]
pub enum QuoteStatus {
  #[serde(rename = "Nuevo")]
  #[sqlx(rename = "Nuevo")]
  New,
  #[serde(rename = "Contactado")]
  #[sqlx(rename = "Contactado")]
  Contacted,
  #[serde(rename = "Cerrado")]
  #[sqlx(rename = "Cerrado")]
  Closed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
  #[serde(rename = "_id")]
  pub id: Uuid,
  #[serde(rename = "service")]
  pub service_id: Uuid,
  #[sqlx(default)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub service_name: Option<String>,
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub message: String,
  pub status: QuoteStatus,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
  #[serde(alias = "service")]
  pub service_id: Uuid,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub phone: Option<String>,
  #[serde(default)]
  pub message: String,
}

impl QuoteRequest {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if self.name.trim().is_empty() {
      errors.push(FieldError::new("name", "El nombre es requerido."));
    }
    if !is_valid_email(self.email.trim()) {
      errors.push(FieldError::new("email", "Por favor, introduce un email válido."));
    }
    if self.message.trim().is_empty() {
      errors.push(FieldError::new("message", "El mensaje es requerido."));
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(AppError::FieldErrors(errors))
    }
  }

  pub fn into_quote(self) -> Quote {
    Quote {
      id: Uuid::new_v4(),
      service_id: self.service_id,
      service_name: None,
      name: self.name.trim().to_string(),
      email: self.email.trim().to_string(),
      phone: self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
      message: self.message.trim().to_string(),
      status: QuoteStatus::New,
      created_at: Utc::now(),
    }
  }
}
