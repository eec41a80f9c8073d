// techlab_server/src/store/memory.rs

use super::{CartStore, CategoryStore, OrderStore, ProductStore, ProjectStore, QuoteStore, ServiceStore, UserStore};
use crate::errors::{AppError, Result};
use crate::models::{Cart, Category, Comment, Order, Product, Project, Quote, QuoteStatus, Service, User};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  categories: HashMap<Uuid, Category>,
  products: HashMap<Uuid, Product>,
  services: HashMap<Uuid, Service>,
  carts: HashMap<Uuid, Cart>,
  orders: HashMap<Uuid, Order>,
  projects: HashMap<Uuid, Project>,
  quotes: HashMap<Uuid, Quote>,
}

impl Tables {
  fn with_author(&self, mut project: Project) -> Project {
    project.author_name = self.users.get(&project.user_id).map(|u| u.name.clone());
    project
  }
}

/// In-process store. Every operation runs under one lock, so multi-record
/// operations such as `place_order` are atomic.
#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn conflict() -> AppError {
  AppError::Conflict("El recurso ya existe.".to_string())
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) {
  items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl UserStore for MemoryStore {
  async fn insert_user(&self, user: &User) -> Result<()> {
    let mut t = self.tables.lock();
    let taken = t.users.values().any(|u| {
      u.email == user.email || (user.nickname.is_some() && u.nickname == user.nickname)
    });
    if taken {
      return Err(conflict());
    }
    t.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.lock().users.get(&id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.tables.lock().users.values().find(|u| u.email == email).cloned())
  }

  async fn find_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
    Ok(
      self
        .tables
        .lock()
        .users
        .values()
        .find(|u| u.nickname.as_deref() == Some(nickname))
        .cloned(),
    )
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let mut users: Vec<User> = self.tables.lock().users.values().cloned().collect();
    newest_first(&mut users, |u| u.created_at);
    Ok(users)
  }

  async fn update_user(&self, user: &User) -> Result<()> {
    let mut t = self.tables.lock();
    let taken = t.users.values().any(|u| {
      u.id != user.id && (u.email == user.email || (user.nickname.is_some() && u.nickname == user.nickname))
    });
    if taken {
      return Err(conflict());
    }
    match t.users.get_mut(&user.id) {
      Some(slot) => {
        *slot = user.clone();
        Ok(())
      }
      None => Err(AppError::NotFound("Usuario no encontrado".to_string())),
    }
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().users.remove(&id).is_some())
  }
}

#[async_trait]
impl CategoryStore for MemoryStore {
  async fn insert_category(&self, category: &Category) -> Result<()> {
    let mut t = self.tables.lock();
    if t.categories.values().any(|c| c.name == category.name) {
      return Err(conflict());
    }
    t.categories.insert(category.id, category.clone());
    Ok(())
  }

  async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
    Ok(self.tables.lock().categories.get(&id).cloned())
  }

  async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
    Ok(self.tables.lock().categories.values().find(|c| c.name == name).cloned())
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let mut categories: Vec<Category> = self.tables.lock().categories.values().cloned().collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(categories)
  }

  async fn update_category(&self, category: &Category) -> Result<()> {
    let mut t = self.tables.lock();
    if t.categories.values().any(|c| c.id != category.id && c.name == category.name) {
      return Err(conflict());
    }
    t.categories.insert(category.id, category.clone());
    Ok(())
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().categories.remove(&id).is_some())
  }
}

#[async_trait]
impl ProductStore for MemoryStore {
  async fn insert_product(&self, product: &Product) -> Result<()> {
    let mut t = self.tables.lock();
    if t.products.values().any(|p| p.sku == product.sku) {
      return Err(conflict());
    }
    t.products.insert(product.id, product.clone());
    Ok(())
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.get(&id).cloned())
  }

  async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
    let t = self.tables.lock();
    Ok(ids.iter().filter_map(|id| t.products.get(id).cloned()).collect())
  }

  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self
      .tables
      .lock()
      .products
      .values()
      .filter(|p| category.map_or(true, |c| p.category == c))
      .cloned()
      .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn search_products(&self, needle: &str) -> Result<Vec<Product>> {
    let needle = needle.to_lowercase();
    let mut products: Vec<Product> = self
      .tables
      .lock()
      .products
      .values()
      .filter(|p| p.matches(&needle))
      .cloned()
      .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn update_product(&self, product: &Product) -> Result<()> {
    let mut t = self.tables.lock();
    if t.products.values().any(|p| p.id != product.id && p.sku == product.sku) {
      return Err(conflict());
    }
    t.products.insert(product.id, product.clone());
    Ok(())
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().products.remove(&id).is_some())
  }
}

#[async_trait]
impl ServiceStore for MemoryStore {
  async fn insert_service(&self, service: &Service) -> Result<()> {
    self.tables.lock().services.insert(service.id, service.clone());
    Ok(())
  }

  async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
    Ok(self.tables.lock().services.get(&id).cloned())
  }

  async fn list_services(&self, category: Option<&str>) -> Result<Vec<Service>> {
    let mut services: Vec<Service> = self
      .tables
      .lock()
      .services
      .values()
      .filter(|s| category.map_or(true, |c| crate::models::ServiceCategory::parse(c) == Some(s.category)))
      .cloned()
      .collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(services)
  }

  async fn search_services(&self, needle: &str) -> Result<Vec<Service>> {
    let needle = needle.to_lowercase();
    let mut services: Vec<Service> = self
      .tables
      .lock()
      .services
      .values()
      .filter(|s| s.matches(&needle))
      .cloned()
      .collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(services)
  }

  async fn update_service(&self, service: &Service) -> Result<()> {
    self.tables.lock().services.insert(service.id, service.clone());
    Ok(())
  }

  async fn delete_service(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().services.remove(&id).is_some())
  }
}

#[async_trait]
impl CartStore for MemoryStore {
  async fn find_cart(&self, user_id: Uuid) -> Result<Option<Cart>> {
    Ok(self.tables.lock().carts.get(&user_id).cloned())
  }

  async fn save_cart(&self, cart: &Cart) -> Result<()> {
    self.tables.lock().carts.insert(cart.user_id, cart.clone());
    Ok(())
  }

  async fn delete_cart(&self, user_id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().carts.remove(&user_id).is_some())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn place_order(&self, order: &Order) -> Result<()> {
    let mut t = self.tables.lock();

    for line in order.items.iter() {
      if line.quantity < 1 {
        return Err(AppError::Validation(format!("Cantidad inválida para el producto: {}", line.name)));
      }
      let Some(product_id) = line.product_id else { continue };
      let in_stock = t.products.get(&product_id).map_or(0, |p| p.stock);
      if in_stock < line.quantity {
        return Err(AppError::InsufficientStock {
          product_id,
          product_name: line.name.clone(),
        });
      }
    }

    let now = Utc::now();
    for line in order.items.iter() {
      if let Some(product) = line.product_id.and_then(|id| t.products.get_mut(&id)) {
        product.stock -= line.quantity;
        product.updated_at = now;
      }
    }
    t.orders.insert(order.id, order.clone());
    t.carts.remove(&order.user_id);
    Ok(())
  }

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.get(&id).cloned())
  }

  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .lock()
      .orders
      .values()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    newest_first(&mut orders, |o| o.created_at);
    Ok(orders)
  }

  async fn update_order_status(&self, order: &Order) -> Result<()> {
    let mut t = self.tables.lock();
    let stored = t
      .orders
      .get_mut(&order.id)
      .ok_or_else(|| AppError::NotFound("Orden no encontrada".to_string()))?;
    stored.status = order.status;
    stored.is_paid = order.is_paid;
    stored.paid_at = order.paid_at;
    stored.updated_at = order.updated_at;
    Ok(())
  }
}

#[async_trait]
impl ProjectStore for MemoryStore {
  async fn insert_project(&self, project: &Project) -> Result<()> {
    self.tables.lock().projects.insert(project.id, project.clone());
    Ok(())
  }

  async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
    let t = self.tables.lock();
    Ok(t.projects.get(&id).cloned().map(|p| t.with_author(p)))
  }

  async fn list_projects(&self) -> Result<Vec<Project>> {
    let t = self.tables.lock();
    let mut projects: Vec<Project> = t.projects.values().cloned().map(|p| t.with_author(p)).collect();
    newest_first(&mut projects, |p| p.created_at);
    Ok(projects)
  }

  async fn update_project(&self, project: &Project) -> Result<()> {
    let mut t = self.tables.lock();
    let stored = t
      .projects
      .get_mut(&project.id)
      .ok_or_else(|| AppError::NotFound("Proyecto no encontrado".to_string()))?;
    stored.title = project.title.clone();
    stored.description = project.description.clone();
    stored.image = project.image.clone();
    stored.updated_at = project.updated_at;
    Ok(())
  }

  async fn delete_project(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().projects.remove(&id).is_some())
  }

  async fn toggle_project_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Project>> {
    let mut t = self.tables.lock();
    let Some(project) = t.projects.get_mut(&id) else {
      return Ok(None);
    };
    project.toggle_like(user_id);
    let project = project.clone();
    Ok(Some(t.with_author(project)))
  }

  async fn add_project_comment(&self, id: Uuid, comment: &Comment) -> Result<Option<Project>> {
    let mut t = self.tables.lock();
    let Some(project) = t.projects.get_mut(&id) else {
      return Ok(None);
    };
    project.comments.push(comment.clone());
    let project = project.clone();
    Ok(Some(t.with_author(project)))
  }
}

#[async_trait]
impl QuoteStore for MemoryStore {
  async fn insert_quote(&self, quote: &Quote) -> Result<()> {
    self.tables.lock().quotes.insert(quote.id, quote.clone());
    Ok(())
  }

  async fn list_quotes(&self) -> Result<Vec<Quote>> {
    let t = self.tables.lock();
    let mut quotes: Vec<Quote> = t
      .quotes
      .values()
      .cloned()
      .map(|mut q| {
        q.service_name = t.services.get(&q.service_id).map(|s| s.name.clone());
        q
      })
      .collect();
    newest_first(&mut quotes, |q| q.created_at);
    Ok(quotes)
  }

  async fn update_quote_status(&self, id: Uuid, status: QuoteStatus) -> Result<Option<Quote>> {
    let mut t = self.tables.lock();
    let Some(quote) = t.quotes.get_mut(&id) else {
      return Ok(None);
    };
    quote.status = status;
    let mut quote = quote.clone();
    quote.service_name = t.services.get(&quote.service_id).map(|s| s.name.clone());
    Ok(Some(quote))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{OrderLine, Role};
  use sqlx::types::Json;
  use std::collections::BTreeMap;

  fn product(name: &str, stock: i32) -> Product {
    let now = Utc::now();
    Product {
      id: Uuid::new_v4(),
      name: name.into(),
      description: String::new(),
      price_cents: 1000,
      sku: format!("SKU-{}", name),
      stock,
      category: "general".into(),
      specs: Json(BTreeMap::new()),
      image: None,
      created_at: now,
      updated_at: now,
    }
  }

  #[tokio::test]
  async fn place_order_is_all_or_nothing() {
    let store = MemoryStore::new();
    let a = product("A", 5);
    let b = product("B", 0);
    store.insert_product(&a).await.unwrap();
    store.insert_product(&b).await.unwrap();
    let user = Uuid::new_v4();
    let mut cart = Cart::new(user);
    cart.add_line(a.id, 2, 1000).unwrap();
    store.save_cart(&cart).await.unwrap();

    let order = Order::new(user, vec![OrderLine::for_product(&a, 2), OrderLine::for_product(&b, 1)]).unwrap();
    let err = store.place_order(&order).await.unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { product_id, .. } if product_id == b.id));
    assert_eq!(store.find_product(a.id).await.unwrap().unwrap().stock, 5);
    assert!(store.find_order(order.id).await.unwrap().is_none());
    assert!(store.find_cart(user).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn place_order_rejects_non_positive_quantity() {
    let store = MemoryStore::new();
    let a = product("A", 5);
    store.insert_product(&a).await.unwrap();
    let mut line = OrderLine::for_product(&a, 1);
    line.quantity = -3;
    let mut order = Order::new(Uuid::new_v4(), vec![]).unwrap();
    order.items = Json(vec![line]);

    assert!(matches!(store.place_order(&order).await, Err(AppError::Validation(_))));
    assert_eq!(store.find_product(a.id).await.unwrap().unwrap().stock, 5);
    assert!(store.find_order(order.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn duplicate_email_is_a_conflict() {
    let store = MemoryStore::new();
    let first = User::new("Ana".into(), "ana@techlab.cl".into(), "h".into(), Role::Customer);
    let second = User::new("Otra".into(), "ana@techlab.cl".into(), "h".into(), Role::Customer);
    store.insert_user(&first).await.unwrap();
    assert!(matches!(store.insert_user(&second).await, Err(AppError::Conflict(_))));
  }

  #[tokio::test]
  async fn projects_carry_current_author_name() {
    let store = MemoryStore::new();
    let admin = User::new("Admin".into(), "admin@techlab.cl".into(), "h".into(), Role::Admin);
    store.insert_user(&admin).await.unwrap();
    let project = Project::new(admin.id, "Dron".into(), "FPV".into(), None);
    store.insert_project(&project).await.unwrap();

    let listed = store.list_projects().await.unwrap();
    assert_eq!(listed[0].author_name.as_deref(), Some("Admin"));
  }
}
