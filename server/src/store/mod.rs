// techlab_server/src/store/mod.rs

//! Persistence seams. Handlers and pipelines only see these traits;
//! `PgStore` backs them with Postgres and `MemoryStore` with in-process maps.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{Cart, Category, Comment, Order, Product, Project, Quote, QuoteStatus, Service, User};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
  async fn insert_user(&self, user: &User) -> Result<()>;
  async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>>;
  async fn list_users(&self) -> Result<Vec<User>>;
  async fn update_user(&self, user: &User) -> Result<()>;
  async fn delete_user(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
  async fn insert_category(&self, category: &Category) -> Result<()>;
  async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
  async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;
  async fn list_categories(&self) -> Result<Vec<Category>>;
  async fn update_category(&self, category: &Category) -> Result<()>;
  async fn delete_category(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
  async fn insert_product(&self, product: &Product) -> Result<()>;
  async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
  /// Products among `ids` that still exist, in no particular order.
  async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>>;
  async fn search_products(&self, needle: &str) -> Result<Vec<Product>>;
  async fn update_product(&self, product: &Product) -> Result<()>;
  async fn delete_product(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ServiceStore: Send + Sync {
  async fn insert_service(&self, service: &Service) -> Result<()>;
  async fn find_service(&self, id: Uuid) -> Result<Option<Service>>;
  async fn list_services(&self, category: Option<&str>) -> Result<Vec<Service>>;
  async fn search_services(&self, needle: &str) -> Result<Vec<Service>>;
  async fn update_service(&self, service: &Service) -> Result<()>;
  async fn delete_service(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
  async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>>;
  /// Inserts or replaces the user's cart.
  async fn save_cart(&self, cart: &Cart) -> Result<()>;
  async fn delete_cart(&self, user_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Persists `order`, takes each product line out of stock and deletes the
  /// owner's cart as one unit. A line whose product no longer has enough
  /// stock fails the whole unit with `InsufficientStock` and changes nothing.
  async fn place_order(&self, order: &Order) -> Result<()>;
  async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;
  async fn update_order_status(&self, order: &Order) -> Result<()>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
  async fn insert_project(&self, project: &Project) -> Result<()>;
  /// Project with its author's current name.
  async fn find_project(&self, id: Uuid) -> Result<Option<Project>>;
  /// Newest first.
  async fn list_projects(&self) -> Result<Vec<Project>>;
  async fn update_project(&self, project: &Project) -> Result<()>;
  async fn delete_project(&self, id: Uuid) -> Result<bool>;
  /// Flips `user_id` in the like set and returns the updated project.
  async fn toggle_project_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Project>>;
  async fn add_project_comment(&self, id: Uuid, comment: &Comment) -> Result<Option<Project>>;
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
  async fn insert_quote(&self, quote: &Quote) -> Result<()>;
  /// Newest first, with the service name populated.
  async fn list_quotes(&self) -> Result<Vec<Quote>>;
  async fn update_quote_status(&self, id: Uuid, status: QuoteStatus) -> Result<Option<Quote>>;
}

/// Everything the application persists.
pub trait Store: UserStore + CategoryStore + ProductStore + ServiceStore + CartStore + OrderStore + ProjectStore + QuoteStore {}

impl<T> Store for T where
  T: UserStore + CategoryStore + ProductStore + ServiceStore + CartStore + OrderStore + ProjectStore + QuoteStore
{
}
