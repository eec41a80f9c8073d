// techlab_server/src/pipelines/cart_pipeline.rs

//! Add-to-cart: increments an existing line or snapshots the current price
//! into a new one. The cart is created on the first add.

use crate::errors::{AppError, Result};
use crate::models::Cart;
use crate::pipelines::contexts::AddToCartCtxData;
use techlab_core::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{debug, info, warn};

pub fn register_add_to_cart_pipeline(flows: &Registry<AppError>) -> Result<()> {
  let mut cart_p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("validate_cart_input", false, None),
    ("fetch_product_for_cart", false, None),
    ("merge_cart_line", false, None),
    ("persist_cart", false, None),
  ]);

  cart_p.on("validate_cart_input", |ctx: ContextData<AddToCartCtxData>| async move {
    let quantity = ctx.read().quantity;
    if quantity < 1 {
      warn!(quantity, "Rejected add-to-cart quantity.");
      return Err(AppError::Validation("La cantidad debe ser al menos 1".to_string()));
    }
    Ok(PipelineControl::Continue)
  })?;

  cart_p.on("fetch_product_for_cart", fetch_product)?;
  cart_p.on("merge_cart_line", merge_line)?;

  cart_p.on("persist_cart", |ctx: ContextData<AddToCartCtxData>| async move {
    let (cart, state) = {
      let guard = ctx.read();
      (guard.cart.clone(), guard.app_state.clone())
    };
    let cart = cart.ok_or_else(|| AppError::Internal("Cart missing before persist.".to_string()))?;
    state.store.save_cart(&cart).await?;
    info!(cart_id = %cart.id, lines = cart.items.len(), "Cart saved.");
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;

  flows.register(cart_p);
  info!("Add-to-cart pipeline registered.");
  Ok(())
}

async fn fetch_product(ctx: ContextData<AddToCartCtxData>) -> Result<PipelineControl> {
  let (product_id, state) = {
    let guard = ctx.read();
    (guard.product_id, guard.app_state.clone())
  };
  let product = state
    .store
    .find_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_string()))?;
  ctx.write().product = Some(product);
  Ok(PipelineControl::Continue)
}

async fn merge_line(ctx: ContextData<AddToCartCtxData>) -> Result<PipelineControl> {
  let (user_id, state) = {
    let guard = ctx.read();
    (guard.user_id, guard.app_state.clone())
  };
  let existing = state.store.find_cart(user_id).await?;

  let mut guard = ctx.write();
  let mut cart = existing.unwrap_or_else(|| {
    debug!(%user_id, "Creating cart on first add.");
    Cart::new(user_id)
  });
  let price_cents = guard
    .product
    .as_ref()
    .map(|p| p.price_cents)
    .ok_or_else(|| AppError::Internal("Product missing before merge.".to_string()))?;
  cart.add_line(guard.product_id, guard.quantity, price_cents)?;
  guard.cart = Some(cart);
  Ok(PipelineControl::Continue)
}
