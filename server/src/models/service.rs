// techlab_server/src/models/service.rs

use crate::errors::{AppError, FieldError, Result};
use crate::models::parse_price_cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "service_category")]
pub enum ServiceCategory {
  #[serde(rename = "Impresión 3D")]
  #[sqlx(rename = "Impresión 3D")]
  Printing3d,
  #[serde(rename = "CNC")]
  #[sqlx(rename = "CNC")]
  Cnc,
  #[serde(rename = "Taller")]
  #[sqlx(rename = "Taller")]
  Workshop,
  #[serde(rename = "Otro")]
  #[sqlx(rename = "Otro")]
  Other,
}

impl ServiceCategory {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim() {
      "Impresión 3D" => Some(Self::Printing3d),
      "CNC" => Some(Self::Cnc),
      "Taller" => Some(Self::Workshop),
      "Otro" => Some(Self::Other),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price_cents: i64,
  pub category: ServiceCategory,
  pub availability: bool,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct ServicePatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub category: Option<ServiceCategory>,
  pub availability: Option<bool>,
}

impl ServicePatch {
  pub fn from_form(fields: &HashMap<String, String>) -> Result<Self> {
    let mut errors = Vec::new();
    let text = |key: &str| fields.get(key).map(|v| v.trim().to_string());

    let price_cents = text("price").and_then(|raw| match parse_price_cents(&raw) {
      Some(cents) if cents > 0 => Some(cents),
      _ => {
        errors.push(FieldError::new("price", "El precio debe ser un valor numérico positivo."));
        None
      }
    });
    let category = text("category").and_then(|raw| {
      let parsed = ServiceCategory::parse(&raw);
      if parsed.is_none() {
        errors.push(FieldError::new("category", "Categoría de servicio inválida."));
      }
      parsed
    });
    let availability = text("availability").and_then(|raw| match raw.as_str() {
      "true" | "1" | "on" => Some(true),
      "false" | "0" | "off" => Some(false),
      _ => {
        errors.push(FieldError::new("availability", "Disponibilidad inválida."));
        None
      }
    });

    if !errors.is_empty() {
      return Err(AppError::FieldErrors(errors));
    }
    Ok(Self {
      name: text("name").filter(|v| !v.is_empty()),
      description: text("description").filter(|v| !v.is_empty()),
      price_cents,
      category,
      availability,
    })
  }
}

impl Service {
  pub fn create(patch: ServicePatch, image: Option<String>) -> Result<Self> {
    let (Some(name), Some(description), Some(price_cents), Some(category)) =
      (patch.name, patch.description, patch.price_cents, patch.category)
    else {
      return Err(AppError::Validation(
        "Por favor, complete todos los campos obligatorios: nombre, descripción, precio y categoría.".to_string(),
      ));
    };
    let now = Utc::now();
    Ok(Self {
      id: Uuid::new_v4(),
      name,
      description,
      price_cents,
      category,
      availability: patch.availability.unwrap_or(true),
      image,
      created_at: now,
      updated_at: now,
    })
  }

  pub fn apply(&mut self, patch: ServicePatch) {
    if let Some(v) = patch.name {
      self.name = v;
    }
    if let Some(v) = patch.description {
      self.description = v;
    }
    if let Some(v) = patch.price_cents {
      self.price_cents = v;
    }
    if let Some(v) = patch.category {
      self.category = v;
    }
    if let Some(v) = patch.availability {
      self.availability = v;
    }
    self.updated_at = Utc::now();
  }

  pub fn matches(&self, needle_lower: &str) -> bool {
    self.name.to_lowercase().contains(needle_lower) || self.description.to_lowercase().contains(needle_lower)
  }
}
