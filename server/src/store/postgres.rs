// techlab_server/src/store/postgres.rs

use super::{CartStore, CategoryStore, OrderStore, ProductStore, ProjectStore, QuoteStore, ServiceStore, UserStore};
use crate::errors::{AppError, Result};
use crate::models::{Cart, Category, Comment, Order, Product, Project, Quote, QuoteStatus, Service, ServiceCategory, User};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{error, instrument, warn};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, nickname, profile_picture, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
  "id, name, description, price_cents, sku, stock, category, specs, image, created_at, updated_at";
const SERVICE_COLUMNS: &str = "id, name, description, price_cents, category, availability, image, created_at, updated_at";
const ORDER_COLUMNS: &str =
  "id, user_id, items, total_price_cents, status, is_paid, paid_at, payment_result, created_at, updated_at";
const PROJECT_SELECT: &str = "SELECT p.id, p.user_id, u.name AS author_name, p.title, p.description, p.image, \
   p.likes, p.comments, p.created_at, p.updated_at FROM projects p LEFT JOIN users u ON u.id = p.user_id";
const QUOTE_SELECT: &str = "SELECT q.id, q.service_id, s.name AS service_name, q.name, q.email, q.phone, \
   q.message, q.status, q.created_at FROM quotes q LEFT JOIN services s ON s.id = q.service_id";

/// Postgres-backed store; schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }
}

fn like_pattern(needle: &str) -> String {
  let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

#[async_trait]
impl UserStore for PgStore {
  async fn insert_user(&self, user: &User) -> Result<()> {
    sqlx::query(
      "INSERT INTO users (id, name, email, password_hash, role, nickname, profile_picture, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.nickname)
    .bind(&user.profile_picture)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE nickname = $1", USER_COLUMNS))
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    Ok(
      sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS))
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn update_user(&self, user: &User) -> Result<()> {
    let result = sqlx::query(
      "UPDATE users SET name = $2, email = $3, password_hash = $4, role = $5, nickname = $6, \
       profile_picture = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.nickname)
    .bind(&user.profile_picture)
    .bind(user.updated_at)
    .execute(&self.pool)
    .await?;
    if result.rows_affected() == 0 {
      return Err(AppError::NotFound("Usuario no encontrado".to_string()));
    }
    Ok(())
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl CategoryStore for PgStore {
  async fn insert_category(&self, category: &Category) -> Result<()> {
    sqlx::query("INSERT INTO categories (id, name, description, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(category.id)
      .bind(&category.name)
      .bind(&category.description)
      .bind(category.created_at)
      .bind(category.updated_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
    Ok(
      sqlx::query_as::<_, Category>(&format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
    Ok(
      sqlx::query_as::<_, Category>(&format!("SELECT {} FROM categories WHERE name = $1", CATEGORY_COLUMNS))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    Ok(
      sqlx::query_as::<_, Category>(&format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLUMNS))
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn update_category(&self, category: &Category) -> Result<()> {
    sqlx::query("UPDATE categories SET name = $2, description = $3, updated_at = $4 WHERE id = $1")
      .bind(category.id)
      .bind(&category.name)
      .bind(&category.description)
      .bind(category.updated_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl ProductStore for PgStore {
  async fn insert_product(&self, product: &Product) -> Result<()> {
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, sku, stock, category, specs, image, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(&product.sku)
    .bind(product.stock)
    .bind(&product.category)
    .bind(&product.specs)
    .bind(&product.image)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE ($1::text IS NULL OR category = $1) ORDER BY name",
        PRODUCT_COLUMNS
      ))
      .bind(category)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn search_products(&self, needle: &str) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE name ILIKE $1 OR description ILIKE $1 ORDER BY name",
        PRODUCT_COLUMNS
      ))
      .bind(like_pattern(needle))
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn update_product(&self, product: &Product) -> Result<()> {
    sqlx::query(
      "UPDATE products SET name = $2, description = $3, price_cents = $4, sku = $5, stock = $6, category = $7, \
       specs = $8, image = $9, updated_at = $10 WHERE id = $1",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(&product.sku)
    .bind(product.stock)
    .bind(&product.category)
    .bind(&product.specs)
    .bind(&product.image)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl ServiceStore for PgStore {
  async fn insert_service(&self, service: &Service) -> Result<()> {
    sqlx::query(
      "INSERT INTO services (id, name, description, price_cents, category, availability, image, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(service.id)
    .bind(&service.name)
    .bind(&service.description)
    .bind(service.price_cents)
    .bind(service.category)
    .bind(service.availability)
    .bind(&service.image)
    .bind(service.created_at)
    .bind(service.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
    Ok(
      sqlx::query_as::<_, Service>(&format!("SELECT {} FROM services WHERE id = $1", SERVICE_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_services(&self, category: Option<&str>) -> Result<Vec<Service>> {
    let category = match category {
      Some(raw) => match ServiceCategory::parse(raw) {
        Some(c) => Some(c),
        None => return Ok(Vec::new()),
      },
      None => None,
    };
    Ok(
      sqlx::query_as::<_, Service>(&format!(
        "SELECT {} FROM services WHERE ($1::service_category IS NULL OR category = $1) ORDER BY name",
        SERVICE_COLUMNS
      ))
      .bind(category)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn search_services(&self, needle: &str) -> Result<Vec<Service>> {
    Ok(
      sqlx::query_as::<_, Service>(&format!(
        "SELECT {} FROM services WHERE name ILIKE $1 OR description ILIKE $1 ORDER BY name",
        SERVICE_COLUMNS
      ))
      .bind(like_pattern(needle))
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn update_service(&self, service: &Service) -> Result<()> {
    sqlx::query(
      "UPDATE services SET name = $2, description = $3, price_cents = $4, category = $5, availability = $6, \
       image = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(service.id)
    .bind(&service.name)
    .bind(&service.description)
    .bind(service.price_cents)
    .bind(service.category)
    .bind(service.availability)
    .bind(&service.image)
    .bind(service.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn delete_service(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM services WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl CartStore for PgStore {
  async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>> {
    Ok(
      sqlx::query_as::<_, Cart>("SELECT id, user_id, items, created_at, updated_at FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn save_cart(&self, cart: &Cart) -> Result<()> {
    sqlx::query(
      "INSERT INTO carts (id, user_id, items, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) \
       ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at",
    )
    .bind(cart.id)
    .bind(cart.user_id)
    .bind(&cart.items)
    .bind(cart.created_at)
    .bind(cart.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn delete_cart(&self, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "pg::place_order", skip(self, order), fields(order_id = %order.id, user_id = %order.user_id), err(Display))]
  async fn place_order(&self, order: &Order) -> Result<()> {
    if let Some(line) = order.items.iter().find(|l| l.quantity < 1) {
      return Err(AppError::Validation(format!("Cantidad inválida para el producto: {}", line.name)));
    }
    let mut tx = self.pool.begin().await?;

    sqlx::query(&format!(
      "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
      ORDER_COLUMNS
    ))
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.items)
    .bind(order.total_price_cents)
    .bind(order.status)
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(&order.payment_result)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    for line in order.items.iter() {
      let Some(product_id) = line.product_id else { continue };
      // Conditional decrement: a concurrent checkout that drained the stock
      // since the pre-check makes this match zero rows.
      let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = now() WHERE id = $2 AND stock >= $1",
      )
      .bind(line.quantity)
      .bind(product_id)
      .execute(&mut *tx)
      .await?;

      if result.rows_affected() == 0 {
        warn!(%product_id, quantity = line.quantity, "Stock reservation lost, rolling back order.");
        tx.rollback().await.map_err(|e| {
          error!(error = %e, "Rollback failed after stock reservation miss.");
          AppError::from(e)
        })?;
        return Err(AppError::InsufficientStock {
          product_id,
          product_name: line.name.clone(),
        });
      }
    }

    sqlx::query("DELETE FROM carts WHERE user_id = $1")
      .bind(order.user_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(())
  }

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(
      sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    Ok(
      sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        ORDER_COLUMNS
      ))
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn update_order_status(&self, order: &Order) -> Result<()> {
    sqlx::query("UPDATE orders SET status = $2, is_paid = $3, paid_at = $4, updated_at = $5 WHERE id = $1")
      .bind(order.id)
      .bind(order.status)
      .bind(order.is_paid)
      .bind(order.paid_at)
      .bind(order.updated_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}

#[async_trait]
impl ProjectStore for PgStore {
  async fn insert_project(&self, project: &Project) -> Result<()> {
    sqlx::query(
      "INSERT INTO projects (id, user_id, title, description, image, likes, comments, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(project.id)
    .bind(project.user_id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.image)
    .bind(&project.likes)
    .bind(&project.comments)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
    Ok(
      sqlx::query_as::<_, Project>(&format!("{} WHERE p.id = $1", PROJECT_SELECT))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_projects(&self) -> Result<Vec<Project>> {
    Ok(
      sqlx::query_as::<_, Project>(&format!("{} ORDER BY p.created_at DESC", PROJECT_SELECT))
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn update_project(&self, project: &Project) -> Result<()> {
    sqlx::query("UPDATE projects SET title = $2, description = $3, image = $4, updated_at = $5 WHERE id = $1")
      .bind(project.id)
      .bind(&project.title)
      .bind(&project.description)
      .bind(&project.image)
      .bind(project.updated_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn delete_project(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn toggle_project_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Project>> {
    let updated = sqlx::query(
      "UPDATE projects SET likes = CASE WHEN $2 = ANY(likes) THEN array_remove(likes, $2) \
       ELSE array_append(likes, $2) END, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(user_id)
    .execute(&self.pool)
    .await?;
    if updated.rows_affected() == 0 {
      return Ok(None);
    }
    self.find_project(id).await
  }

  async fn add_project_comment(&self, id: Uuid, comment: &Comment) -> Result<Option<Project>> {
    let updated = sqlx::query(
      "UPDATE projects SET comments = comments || jsonb_build_array($2::jsonb), updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(Json(comment))
    .execute(&self.pool)
    .await?;
    if updated.rows_affected() == 0 {
      return Ok(None);
    }
    self.find_project(id).await
  }
}

#[async_trait]
impl QuoteStore for PgStore {
  async fn insert_quote(&self, quote: &Quote) -> Result<()> {
    sqlx::query(
      "INSERT INTO quotes (id, service_id, name, email, phone, message, status, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(quote.id)
    .bind(quote.service_id)
    .bind(&quote.name)
    .bind(&quote.email)
    .bind(&quote.phone)
    .bind(&quote.message)
    .bind(quote.status)
    .bind(quote.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn list_quotes(&self) -> Result<Vec<Quote>> {
    Ok(
      sqlx::query_as::<_, Quote>(&format!("{} ORDER BY q.created_at DESC", QUOTE_SELECT))
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn update_quote_status(&self, id: Uuid, status: QuoteStatus) -> Result<Option<Quote>> {
    let updated = sqlx::query("UPDATE quotes SET status = $2 WHERE id = $1")
      .bind(id)
      .bind(status)
      .execute(&self.pool)
      .await?;
    if updated.rows_affected() == 0 {
      return Ok(None);
    }
    Ok(
      sqlx::query_as::<_, Quote>(&format!("{} WHERE q.id = $1", QUOTE_SELECT))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::like_pattern;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    assert_eq!(like_pattern("servo"), "%servo%");
  }
}
