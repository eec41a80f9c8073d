// techlab_server/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  auth_handlers, cart_handlers, category_handlers, order_handlers, product_handlers, profile_handlers,
  project_handlers, quote_handlers, search_handlers, service_handlers, user_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed JSON bodies, paths and query strings become `{message}` 400s.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("Cuerpo de la solicitud inválido: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("Identificador inválido: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("Parámetros de consulta inválidos: {}", err)).into()
    }));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);

  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/users")
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/me", web::get().to(auth_handlers::me_handler))
          .route("", web::get().to(user_handlers::list_users_handler))
          .route("", web::post().to(user_handlers::create_user_handler))
          .route("/{id}", web::put().to(user_handlers::update_user_handler))
          .route("/{id}", web::delete().to(user_handlers::delete_user_handler)),
      )
      .service(
        web::scope("/categories")
          .route("", web::get().to(category_handlers::list_categories_handler))
          .route("", web::post().to(category_handlers::create_category_handler))
          .route("/{id}", web::get().to(category_handlers::get_category_handler))
          .route("/{id}", web::put().to(category_handlers::update_category_handler))
          .route("/{id}", web::delete().to(category_handlers::delete_category_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          // Before `/{id}` so "export" is not taken for an id.
          .route("/export", web::get().to(product_handlers::export_products_handler))
          .route("/{id}", web::get().to(product_handlers::get_product_handler))
          .route("/{id}", web::put().to(product_handlers::update_product_handler))
          .route("/{id}", web::delete().to(product_handlers::delete_product_handler)),
      )
      .service(
        web::scope("/services")
          .route("", web::get().to(service_handlers::list_services_handler))
          .route("", web::post().to(service_handlers::create_service_handler))
          .route("/{id}", web::get().to(service_handlers::get_service_handler))
          .route("/{id}", web::put().to(service_handlers::update_service_handler))
          .route("/{id}", web::delete().to(service_handlers::delete_service_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{product_id}", web::put().to(cart_handlers::update_cart_item_handler))
          .route("/items/{product_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/myorders", web::get().to(order_handlers::my_orders_handler))
          .route("/{id}", web::get().to(order_handlers::get_order_handler))
          .route("/{id}/status", web::put().to(order_handlers::update_order_status_handler)),
      )
      .service(
        web::scope("/profile")
          .route("", web::get().to(profile_handlers::get_profile_handler))
          .route("", web::put().to(profile_handlers::update_profile_handler)),
      )
      .service(
        web::scope("/projects")
          .route("", web::get().to(project_handlers::list_projects_handler))
          .route("", web::post().to(project_handlers::create_project_handler))
          .route("/{id}", web::get().to(project_handlers::get_project_handler))
          .route("/{id}", web::put().to(project_handlers::update_project_handler))
          .route("/{id}", web::delete().to(project_handlers::delete_project_handler))
          .route("/{id}/like", web::put().to(project_handlers::like_project_handler))
          .route("/{id}/comment", web::post().to(project_handlers::comment_project_handler)),
      )
      .service(
        web::scope("/quotes")
          .route("", web::post().to(quote_handlers::create_quote_handler))
          .route("", web::get().to(quote_handlers::list_quotes_handler))
          .route("/{id}/status", web::put().to(quote_handlers::update_quote_status_handler)),
      )
      .route("/search", web::get().to(search_handlers::search_handler)),
  );
}
