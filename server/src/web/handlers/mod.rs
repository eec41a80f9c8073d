// techlab_server/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod cart_handlers;
pub mod category_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod profile_handlers;
pub mod project_handlers;
pub mod quote_handlers;
pub mod search_handlers;
pub mod service_handlers;
pub mod user_handlers;
