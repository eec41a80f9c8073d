// techlab_server/src/models/order.rs

use crate::errors::{AppError, Result};
use crate::models::cart::amount_too_large;
use crate::models::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
  Pending,
  InProgress,
  Completed,
  Canceled,
}

impl OrderStatus {
  /// pending → in-progress | completed | canceled; in-progress → completed | canceled.
  /// Completed and canceled orders are final.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Pending, InProgress) | (Pending, Completed) | (Pending, Canceled) | (InProgress, Completed) | (InProgress, Canceled)
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  /// Product or service name at purchase time.
  pub name: String,
  pub quantity: i32,
  pub price_cents: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub product_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub service_id: Option<Uuid>,
}

impl OrderLine {
  /// Line priced from the live catalog entry.
  pub fn for_product(product: &Product, quantity: i32) -> Self {
    Self {
      name: product.name.clone(),
      quantity,
      price_cents: product.price_cents,
      product_id: Some(product.id),
      service_id: None,
    }
  }

  pub fn subtotal_cents(&self) -> Result<i64> {
    self.price_cents.checked_mul(i64::from(self.quantity)).ok_or_else(amount_too_large)
  }
}

/// Gateway receipt attached to an order. No gateway is wired in; the field
/// is carried so records stay compatible with one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
  pub id: String,
  pub status: String,
  pub update_time: String,
  pub email_address: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  #[serde(rename = "_id")]
  pub id: Uuid,
  #[serde(rename = "user")]
  pub user_id: Uuid,
  pub items: Json<Vec<OrderLine>>,
  pub total_price_cents: i64,
  pub status: OrderStatus,
  pub is_paid: bool,
  pub paid_at: Option<DateTime<Utc>>,
  pub payment_result: Option<Json<PaymentResult>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub fn total_of(lines: &[OrderLine]) -> Result<i64> {
  lines
    .iter()
    .try_fold(0i64, |total, line| total.checked_add(line.subtotal_cents()?).ok_or_else(amount_too_large))
}

/// All-or-nothing stock check: the first line asking for more than the
/// product holds fails the whole order. Quantities below 1 are rejected.
pub fn check_stock<'a>(lines: impl IntoIterator<Item = (&'a Product, i32)>) -> Result<()> {
  for (product, quantity) in lines {
    if quantity < 1 {
      return Err(AppError::Validation(format!("Cantidad inválida para el producto: {}", product.name)));
    }
    if quantity > product.stock {
      return Err(AppError::InsufficientStock {
        product_id: product.id,
        product_name: product.name.clone(),
      });
    }
  }
  Ok(())
}

impl Order {
  pub fn new(user_id: Uuid, lines: Vec<OrderLine>) -> Result<Self> {
    let now = Utc::now();
    Ok(Self {
      id: Uuid::new_v4(),
      user_id,
      total_price_cents: total_of(&lines)?,
      items: Json(lines),
      status: OrderStatus::Pending,
      is_paid: false,
      paid_at: None,
      payment_result: None,
      created_at: now,
      updated_at: now,
    })
  }

  /// Moves the order to `next`. Completing marks it paid.
  pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<()> {
    if !self.status.can_transition_to(next) {
      return Err(AppError::Validation(format!(
        "Transición de estado no permitida: {:?} -> {:?}",
        self.status, next
      )));
    }
    self.status = next;
    if next == OrderStatus::Completed {
      self.is_paid = true;
      self.paid_at = Some(now);
    }
    self.updated_at = now;
    Ok(())
  }

  pub fn is_visible_to(&self, user_id: Uuid, is_admin: bool) -> bool {
    is_admin || self.user_id == user_id
  }
}
