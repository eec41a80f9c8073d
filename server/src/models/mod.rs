// techlab_server/src/models/mod.rs

//! Domain records and the pure rules that govern them.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod project;
pub mod quote;
pub mod service;
pub mod user;

pub use cart::{Cart, CartLine, CartLineView, CartView};
pub use category::Category;
pub use order::{Order, OrderLine, OrderStatus, PaymentResult};
pub use product::{Product, ProductSummary};
pub use project::{Comment, Project};
pub use quote::{Quote, QuoteStatus};
pub use service::{Service, ServiceCategory};
pub use user::{Role, User};

/// Parses a decimal amount such as `"10"`, `"10.5"` or `"10.50"` into cents.
/// At most two fractional digits are accepted.
pub fn parse_price_cents(raw: &str) -> Option<i64> {
  let raw = raw.trim();
  let (whole, fraction) = match raw.split_once('.') {
    Some((w, f)) => (w, f),
    None => (raw, ""),
  };
  if whole.is_empty() || fraction.len() > 2 {
    return None;
  }
  if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
    return None;
  }
  let whole: i64 = whole.parse().ok()?;
  let fraction: i64 = match fraction.len() {
    0 => 0,
    1 => fraction.parse::<i64>().ok()? * 10,
    _ => fraction.parse().ok()?,
  };
  whole.checked_mul(100)?.checked_add(fraction)
}

/// Loose `local@domain.tld` check.
pub fn is_valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || email.chars().any(char::is_whitespace) {
    return false;
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
    None => false,
  }
}

pub(crate) fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}
