// techlab_server/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in
//! `ContextData` and fill the `Option` fields as the steps complete.

use crate::models::{Cart, Order, OrderLine, Product, User};
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub name: String,
  pub email: String,
  pub password: String,
  pub requested_role: Option<String>,
  pub created_user: Option<User>,
  pub token: Option<String>,
}

impl SignupCtxData {
  pub fn new(app_state: AppState, name: String, email: String, password: String, requested_role: Option<String>) -> Self {
    Self {
      app_state,
      name,
      email,
      password,
      requested_role,
      created_user: None,
      token: None,
    }
  }
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub user: Option<User>,
  pub token: Option<String>,
}

impl SigninCtxData {
  pub fn new(app_state: AppState, email: String, password: String) -> Self {
    Self {
      app_state,
      email,
      password,
      user: None,
      token: None,
    }
  }
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  pub cart: Option<Cart>,
}

impl AddToCartCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      app_state,
      user_id,
      product_id,
      quantity,
      product: None,
      cart: None,
    }
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub cart: Option<Cart>,
  /// Live catalog records for the cart's lines, in cart order.
  pub products: Vec<Product>,
  pub lines: Vec<OrderLine>,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, user_id: Uuid) -> Self {
    Self {
      app_state,
      user_id,
      cart: None,
      products: Vec::new(),
      lines: Vec::new(),
      order: None,
    }
  }
}
