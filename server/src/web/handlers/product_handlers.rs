// techlab_server/src/web/handlers/product_handlers.rs

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::product::ProductPatch;
use crate::models::Product;
use crate::services::export::{products_workbook, PRODUCTS_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::services::object_storage::store_image;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::upload::read_form;

#[derive(Deserialize, Debug)]
pub struct ListProductsQuery {
  pub category: Option<String>,
}

fn not_found() -> AppError {
  AppError::NotFound("Producto no encontrado".to_string())
}

#[instrument(name = "handler::list_products", skip(app_state, query))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse> {
  let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
  let products = app_state.store.list_products(category).await?;
  info!(count = products.len(), ?category, "Products listed.");
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  match app_state.store.find_product(product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(product)),
    None => {
      warn!(%product_id, "Product not found.");
      Err(not_found())
    }
  }
}

#[instrument(name = "handler::create_product", skip_all)]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: Multipart,
) -> Result<HttpResponse> {
  let form = read_form(payload, "image", app_state.config.max_upload_bytes).await?;
  let patch = ProductPatch::from_form(&form.fields)?;

  let mut product = Product::create(patch, None)?;
  if let Some(file) = form.file {
    product.image = Some(store_image(app_state.objects.as_ref(), "", file).await?);
  }
  app_state.store.insert_product(&product).await?;
  info!(product_id = %product.id, sku = %product.sku, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, _admin, payload, path), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: Multipart,
) -> Result<HttpResponse> {
  let mut product = app_state.store.find_product(path.into_inner()).await?.ok_or_else(not_found)?;
  let form = read_form(payload, "image", app_state.config.max_upload_bytes).await?;
  let patch = ProductPatch::from_form(&form.fields)?;

  if let Some(file) = form.file {
    product.image = Some(store_image(app_state.objects.as_ref(), "", file).await?);
  }
  product.apply(patch);
  app_state.store.update_product(&product).await?;
  Ok(HttpResponse::Ok().json(product))
}

pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  if !app_state.store.delete_product(path.into_inner()).await? {
    return Err(not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Producto eliminado" })))
}

#[instrument(name = "handler::export_products", skip_all)]
pub async fn export_products_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
  let products = app_state.store.list_products(None).await?;
  let bytes = products_workbook(&products)?;
  info!(count = products.len(), size = bytes.len(), "Product export generated.");
  Ok(
    HttpResponse::Ok()
      .content_type(XLSX_CONTENT_TYPE)
      .insert_header(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(PRODUCTS_FILE_NAME.to_string())],
      })
      .body(bytes),
  )
}
