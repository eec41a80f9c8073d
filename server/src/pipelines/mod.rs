// techlab_server/src/pipelines/mod.rs

//! The multi-step request flows, each registered once at startup and run
//! by handlers through the shared registry.

use crate::errors::{AppError, Result};
use techlab_core::Registry;

pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

pub fn register_all_pipelines(flows: &Registry<AppError>) -> Result<()> {
  signup_pipeline::register_signup_pipeline(flows)?;
  signin_pipeline::register_signin_pipeline(flows)?;
  cart_pipeline::register_add_to_cart_pipeline(flows)?;
  checkout_pipeline::register_checkout_pipeline(flows)?;
  tracing::info!(pipelines = flows.len(), "All application pipelines registered.");
  Ok(())
}
