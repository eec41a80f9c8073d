// techlab_server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use techlab_core::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartView};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use crate::web::extractors::CustomerUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
  pub product_id: Uuid,
  #[serde(default = "one")]
  pub quantity: i32,
}

fn one() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityRequest {
  pub quantity: i32,
}

/// Populates product fields for every line; deleted products show as `null`.
async fn render(state: &AppState, cart: Option<&Cart>) -> Result<CartView> {
  let Some(cart) = cart else {
    return Ok(CartView::empty());
  };
  let products = state.store.find_products(&cart.product_ids()).await?;
  CartView::build(cart, &products)
}

#[instrument(name = "handler::get_cart", skip_all, fields(user_id = %customer.0.id))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, customer: CustomerUser) -> Result<HttpResponse> {
  let cart = app_state.store.find_cart(customer.0.id).await?;
  Ok(HttpResponse::Ok().json(render(&app_state, cart.as_ref()).await?))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, payload, customer),
  fields(user_id = %customer.0.id, product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  payload: web::Json<AddToCartRequest>,
) -> Result<HttpResponse> {
  let ctx = ContextData::new(AddToCartCtxData::new(
    app_state.get_ref().clone(),
    customer.0.id,
    payload.product_id,
    payload.quantity,
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => {
      let cart = ctx.read().cart.clone();
      let cart = cart.ok_or_else(|| AppError::Internal("Cart update completed without a cart.".to_string()))?;
      info!(cart_id = %cart.id, "Item added to cart.");
      Ok(HttpResponse::Created().json(render(&app_state, Some(&cart)).await?))
    }
    Ok(PipelineResult::Stopped) => {
      warn!("Add-to-cart pipeline was stopped by a handler.");
      Err(AppError::PipelineHalted)
    }
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::update_cart_item", skip(app_state, customer, path, payload), fields(user_id = %customer.0.id, product_id = %path.as_ref()))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  let cart = app_state.store.find_cart(customer.0.id).await?;

  let cart = match cart {
    Some(mut cart) => {
      cart.set_quantity(product_id, payload.quantity)?;
      app_state.store.save_cart(&cart).await?;
      Some(cart)
    }
    // Zero or less means remove, which never fails.
    None if payload.quantity <= 0 => None,
    None => return Err(AppError::NotFound("Carrito no encontrado".to_string())),
  };
  Ok(HttpResponse::Ok().json(render(&app_state, cart.as_ref()).await?))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, customer, path), fields(user_id = %customer.0.id, product_id = %path.as_ref()))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  let mut cart = app_state.store.find_cart(customer.0.id).await?;

  if let Some(cart) = cart.as_mut() {
    if cart.remove_line(product_id) {
      app_state.store.save_cart(cart).await?;
    }
  }
  Ok(HttpResponse::Ok().json(render(&app_state, cart.as_ref()).await?))
}
