// techlab_server/src/pipelines/checkout_pipeline.rs

//! Cart → order. Lines are priced from the live catalog, stock is checked
//! for every line up front, and the store then places the order, takes the
//! stock and drops the cart as one unit.

use crate::errors::{AppError, Result};
use crate::models::order::check_stock;
use crate::models::{Order, OrderLine, Product};
use crate::pipelines::contexts::CheckoutCtxData;
use std::collections::HashMap;
use techlab_core::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub fn register_checkout_pipeline(flows: &Registry<AppError>) -> Result<()> {
  let mut checkout_p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("load_cart_checkout", false, None),
    ("price_lines_checkout", false, None),
    ("verify_stock_checkout", false, None),
    ("place_order_checkout", false, None),
  ]);

  checkout_p.on("load_cart_checkout", load_cart)?;
  checkout_p.on("price_lines_checkout", price_lines)?;

  checkout_p.on("verify_stock_checkout", |ctx: ContextData<CheckoutCtxData>| async move {
    let guard = ctx.read();
    let quantities = guard.lines.iter().map(|l| l.quantity);
    check_stock(guard.products.iter().zip(quantities))?;
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;

  checkout_p.on("place_order_checkout", place_order)?;

  checkout_p.after("place_order_checkout", |ctx: ContextData<CheckoutCtxData>| async move {
    if let Some(order) = ctx.read().order.as_ref() {
      info!(
        order_id = %order.id,
        user_id = %order.user_id,
        total_price_cents = order.total_price_cents,
        lines = order.items.len(),
        "Order placed."
      );
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;

  flows.register(checkout_p);
  info!("Checkout pipeline registered.");
  Ok(())
}

async fn load_cart(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (user_id, state) = {
    let guard = ctx.read();
    (guard.user_id, guard.app_state.clone())
  };

  let cart = state.store.find_cart(user_id).await?;
  match cart {
    Some(cart) if !cart.is_empty() => {
      ctx.write().cart = Some(cart);
      Ok(PipelineControl::Continue)
    }
    _ => {
      warn!(%user_id, "Checkout with an empty cart.");
      Err(AppError::InvalidState("El carrito está vacío.".to_string()))
    }
  }
}

/// Builds one order line per cart line from the product's current name and
/// price. The cart's price snapshot is not used here.
async fn price_lines(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (cart, state) = {
    let guard = ctx.read();
    (guard.cart.clone(), guard.app_state.clone())
  };
  let cart = cart.ok_or_else(|| AppError::Internal("Cart missing before pricing.".to_string()))?;

  let found = state.store.find_products(&cart.product_ids()).await?;
  let mut by_id: HashMap<Uuid, Product> = found.into_iter().map(|p| (p.id, p)).collect();

  let mut products = Vec::with_capacity(cart.items.len());
  let mut lines = Vec::with_capacity(cart.items.len());
  for line in cart.items.iter() {
    let product = by_id.remove(&line.product_id).ok_or_else(|| {
      warn!(product_id = %line.product_id, "Cart line refers to a deleted product.");
      AppError::NotFound(format!("Producto no encontrado: {}", line.product_id))
    })?;
    lines.push(OrderLine::for_product(&product, line.quantity));
    products.push(product);
  }

  let mut guard = ctx.write();
  guard.products = products;
  guard.lines = lines;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::place_order", skip(ctx), err(Display))]
async fn place_order(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (user_id, lines, state) = {
    let guard = ctx.read();
    (guard.user_id, guard.lines.clone(), guard.app_state.clone())
  };

  let order = Order::new(user_id, lines)?;
  state.store.place_order(&order).await?;
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}
