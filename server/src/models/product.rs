// techlab_server/src/models/product.rs

use crate::errors::{AppError, FieldError, Result};
use crate::models::parse_price_cents;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price_cents: i64,
  pub sku: String,
  pub stock: i32,
  /// Free-text category tag, matched exactly by `?category=`.
  pub category: String,
  pub specs: Json<BTreeMap<String, String>>,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The fields a cart view shows for each line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub image: Option<String>,
}

impl From<&Product> for ProductSummary {
  fn from(p: &Product) -> Self {
    Self {
      id: p.id,
      name: p.name.clone(),
      price_cents: p.price_cents,
      image: p.image.clone(),
    }
  }
}

/// Parsed product form. Every field is optional so the same type serves
/// creation (all required) and partial updates.
#[derive(Debug, Default, Clone)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub sku: Option<String>,
  pub stock: Option<i32>,
  pub category: Option<String>,
  pub specs: Option<BTreeMap<String, String>>,
}

impl ProductPatch {
  pub fn from_form(fields: &HashMap<String, String>) -> Result<Self> {
    let mut errors = Vec::new();
    let text = |key: &str| fields.get(key).map(|v| v.trim().to_string());

    let price_cents = match text("price") {
      Some(raw) => match parse_price_cents(&raw) {
        Some(cents) if cents > 0 => Some(cents),
        _ => {
          errors.push(FieldError::new("price", "El precio debe ser un valor numérico positivo."));
          None
        }
      },
      None => None,
    };

    let stock = match text("stock") {
      Some(raw) => match raw.parse::<i32>() {
        Ok(n) if n >= 0 => Some(n),
        _ => {
          errors.push(FieldError::new("stock", "El stock debe ser un entero mayor o igual a 0."));
          None
        }
      },
      None => None,
    };

    let specs = match fields.get("specs").filter(|s| !s.trim().is_empty()) {
      Some(raw) => match serde_json::from_str::<BTreeMap<String, String>>(raw) {
        Ok(map) => Some(map),
        Err(_) => {
          errors.push(FieldError::new("specs", "Las especificaciones deben ser un objeto JSON de textos."));
          None
        }
      },
      None => None,
    };

    for key in ["name", "sku", "category"] {
      if matches!(text(key), Some(ref v) if v.is_empty()) {
        errors.push(FieldError::new(key, "El campo no puede estar vacío."));
      }
    }

    if !errors.is_empty() {
      return Err(AppError::FieldErrors(errors));
    }

    Ok(Self {
      name: text("name"),
      description: text("description"),
      price_cents,
      sku: text("sku"),
      stock,
      category: text("category"),
      specs,
    })
  }
}

impl Product {
  pub fn create(patch: ProductPatch, image: Option<String>) -> Result<Self> {
    let mut missing = Vec::new();
    for (field, present) in [
      ("name", patch.name.is_some()),
      ("description", patch.description.is_some()),
      ("price", patch.price_cents.is_some()),
      ("sku", patch.sku.is_some()),
      ("category", patch.category.is_some()),
    ] {
      if !present {
        missing.push(FieldError::new(field, "Campo obligatorio."));
      }
    }
    if !missing.is_empty() {
      return Err(AppError::FieldErrors(missing));
    }

    let now = Utc::now();
    Ok(Self {
      id: Uuid::new_v4(),
      name: patch.name.unwrap_or_default(),
      description: patch.description.unwrap_or_default(),
      price_cents: patch.price_cents.unwrap_or_default(),
      sku: patch.sku.unwrap_or_default(),
      stock: patch.stock.unwrap_or(0),
      category: patch.category.unwrap_or_default(),
      specs: Json(patch.specs.unwrap_or_default()),
      image,
      created_at: now,
      updated_at: now,
    })
  }

  pub fn apply(&mut self, patch: ProductPatch) {
    if let Some(v) = patch.name {
      self.name = v;
    }
    if let Some(v) = patch.description {
      self.description = v;
    }
    if let Some(v) = patch.price_cents {
      self.price_cents = v;
    }
    if let Some(v) = patch.sku {
      self.sku = v;
    }
    if let Some(v) = patch.stock {
      self.stock = v;
    }
    if let Some(v) = patch.category {
      self.category = v;
    }
    if let Some(v) = patch.specs {
      self.specs = Json(v);
    }
    self.updated_at = Utc::now();
  }

  /// Case-insensitive substring match over name and description.
  pub fn matches(&self, needle_lower: &str) -> bool {
    self.name.to_lowercase().contains(needle_lower) || self.description.to_lowercase().contains(needle_lower)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn create_requires_core_fields() {
    let patch = ProductPatch::from_form(&form(&[("name", "Sensor"), ("price", "12.50")])).unwrap();
    match Product::create(patch, None) {
      Err(AppError::FieldErrors(errors)) => {
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "sku", "category"]);
      }
      other => panic!("expected field errors, got {:?}", other.map(|p| p.id)),
    }
  }

  #[test]
  fn non_positive_price_and_negative_stock_are_rejected() {
    let err = ProductPatch::from_form(&form(&[("price", "0"), ("stock", "-1")])).unwrap_err();
    match err {
      AppError::FieldErrors(errors) => assert_eq!(errors.len(), 2),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn apply_only_touches_present_fields() {
    let patch = ProductPatch::from_form(&form(&[
      ("name", "Arduino"),
      ("description", "Placa"),
      ("price", "10"),
      ("sku", "ARD-1"),
      ("category", "placas"),
      ("stock", "5"),
      ("specs", r#"{"voltaje":"5V"}"#),
    ]))
    .unwrap();
    let mut product = Product::create(patch, None).unwrap();

    product.apply(ProductPatch::from_form(&form(&[("price", "11.90")])).unwrap());

    assert_eq!(product.price_cents, 1190);
    assert_eq!(product.name, "Arduino");
    assert_eq!(product.stock, 5);
    assert_eq!(product.specs.get("voltaje").map(String::as_str), Some("5V"));
  }

  #[test]
  fn search_matches_description_case_insensitively() {
    let patch = ProductPatch::from_form(&form(&[
      ("name", "Kit"),
      ("description", "Incluye Servomotor SG90"),
      ("price", "3"),
      ("sku", "K-1"),
      ("category", "kits"),
    ]))
    .unwrap();
    let product = Product::create(patch, None).unwrap();
    assert!(product.matches("servomotor"));
    assert!(!product.matches("impresora"));
  }
}
