// techlab_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use techlab_core::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::OrderStatus;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthUser};

#[derive(Deserialize, Debug)]
pub struct UpdateStatusRequest {
  pub status: OrderStatus,
}

fn not_found() -> AppError {
  AppError::NotFound("Orden no encontrada".to_string())
}

/// Checks out the caller's cart.
#[instrument(name = "handler::create_order", skip_all, fields(user_id = %user.0.id))]
pub async fn create_order_handler(app_state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
  let ctx = ContextData::new(CheckoutCtxData::new(app_state.get_ref().clone(), user.0.id));

  match app_state.flows.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => {
      let order = ctx.read().order.clone();
      let order = order.ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
      info!(order_id = %order.id, "Checkout finished.");
      Ok(HttpResponse::Created().json(order))
    }
    Ok(PipelineResult::Stopped) => {
      warn!("Checkout pipeline was stopped by a handler.");
      Err(AppError::PipelineHalted)
    }
    Err(e) => {
      warn!(error = %e, "Checkout failed.");
      Err(e)
    }
  }
}

#[instrument(name = "handler::my_orders", skip_all, fields(user_id = %user.0.id))]
pub async fn my_orders_handler(app_state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
  let orders = app_state.store.list_orders_for_user(user.0.id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, user, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  user: AuthUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order = app_state.store.find_order(path.into_inner()).await?.ok_or_else(not_found)?;
  if !order.is_visible_to(user.0.id, user.0.is_admin()) {
    warn!(viewer = %user.0.id, "Order viewed by someone other than its owner.");
    return Err(AppError::Forbidden("No autorizado para ver esta orden".to_string()));
  }
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order_status", skip(app_state, _admin, path, payload), fields(order_id = %path.as_ref(), status = ?payload.status))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse> {
  let mut order = app_state.store.find_order(path.into_inner()).await?.ok_or_else(not_found)?;
  order.transition(payload.status, Utc::now())?;
  app_state.store.update_order_status(&order).await?;
  info!(status = ?order.status, is_paid = order.is_paid, "Order status updated.");
  Ok(HttpResponse::Ok().json(order))
}
