// techlab_server/src/models/cart.rs

use crate::errors::{AppError, Result};
use crate::models::product::{Product, ProductSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: Uuid,
  pub quantity: i32,
  /// Catalog price when the product was first added.
  pub price_cents: i64,
}

/// The single active cart of a user.
#[derive(Debug, Clone, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Uuid,
  pub items: Json<Vec<CartLine>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  pub fn new(user_id: Uuid) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id,
      items: Json(Vec::new()),
      created_at: now,
      updated_at: now,
    }
  }

  pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
    self.items.iter().find(|l| l.product_id == product_id)
  }

  /// Adds `quantity` units. An existing line is incremented and keeps its
  /// original price snapshot; a new line snapshots `price_cents`.
  /// The cart is left untouched when the quantity is invalid or would overflow.
  pub fn add_line(&mut self, product_id: Uuid, quantity: i32, price_cents: i64) -> Result<()> {
    if quantity < 1 {
      return Err(AppError::Validation("La cantidad debe ser al menos 1".to_string()));
    }
    match self.items.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) => {
        line.quantity = line.quantity.checked_add(quantity).ok_or_else(quantity_too_large)?;
      }
      None => self.items.push(CartLine {
        product_id,
        quantity,
        price_cents,
      }),
    }
    self.updated_at = Utc::now();
    Ok(())
  }

  /// Drops the line for `product_id`. Absent lines are not an error.
  pub fn remove_line(&mut self, product_id: Uuid) -> bool {
    let before = self.items.len();
    self.items.retain(|l| l.product_id != product_id);
    let removed = self.items.len() != before;
    if removed {
      self.updated_at = Utc::now();
    }
    removed
  }

  /// Overwrites a line's quantity; a non-positive quantity removes the line.
  pub fn set_quantity(&mut self, product_id: Uuid, quantity: i32) -> Result<()> {
    if quantity <= 0 {
      self.remove_line(product_id);
      return Ok(());
    }
    let line = self
      .items
      .iter_mut()
      .find(|l| l.product_id == product_id)
      .ok_or_else(|| AppError::NotFound("Producto no encontrado en el carrito".to_string()))?;
    line.quantity = quantity;
    self.updated_at = Utc::now();
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Σ(price snapshot × quantity), recomputed on every call.
  pub fn total_cents(&self) -> Result<i64> {
    self.items.iter().try_fold(0i64, |total, l| {
      l.price_cents
        .checked_mul(i64::from(l.quantity))
        .and_then(|subtotal| total.checked_add(subtotal))
        .ok_or_else(amount_too_large)
    })
  }

  pub fn product_ids(&self) -> Vec<Uuid> {
    self.items.iter().map(|l| l.product_id).collect()
  }
}

fn quantity_too_large() -> AppError {
  AppError::Validation("La cantidad supera el máximo permitido.".to_string())
}

pub(crate) fn amount_too_large() -> AppError {
  AppError::Validation("El importe supera el máximo permitido.".to_string())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
  /// `None` when the product has since been deleted from the catalog.
  pub product: Option<ProductSummary>,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_cents: i64,
}

/// Cart as returned to clients, with product fields populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
  pub id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user: Option<Uuid>,
  pub items: Vec<CartLineView>,
  pub total_price_cents: i64,
}

impl CartView {
  pub fn empty() -> Self {
    Self {
      id: None,
      user: None,
      items: Vec::new(),
      total_price_cents: 0,
    }
  }

  pub fn build(cart: &Cart, products: &[Product]) -> Result<Self> {
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();
    Ok(Self {
      id: Some(cart.id),
      user: Some(cart.user_id),
      items: cart
        .items
        .iter()
        .map(|line| CartLineView {
          product: by_id.get(&line.product_id).map(|p| ProductSummary::from(*p)),
          product_id: line.product_id,
          quantity: line.quantity,
          price_cents: line.price_cents,
        })
        .collect(),
      total_price_cents: cart.total_cents()?,
    })
  }
}
