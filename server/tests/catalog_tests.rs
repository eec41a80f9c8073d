// tests/catalog_tests.rs
#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::*;
use serde_json::{json, Value};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

fn product_fields() -> Vec<(&'static str, &'static str)> {
  vec![
    ("name", "Kit de Robótica"),
    ("description", "Kit educativo con sensores"),
    ("price", "129.90"),
    ("sku", "KIT-ROBO-01"),
    ("stock", "7"),
    ("category", "Robótica"),
    ("specs", r#"{"edad":"10+"}"#),
  ]
}

#[actix_web::test]
async fn admin_creates_product_with_image() {
  let (state, objects) = test_state_with_objects();
  let (_, admin_token) = seed_admin(&state).await;
  let app = test_app!(state);

  let (content_type, body) = multipart_body(&product_fields(), Some(("image", "kit.PNG", "image/png", PNG_BYTES)));
  let req = test::TestRequest::post()
    .uri("/api/products")
    .insert_header(bearer(&admin_token))
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let product: Value = test::read_body_json(resp).await;
  assert_eq!(product["priceCents"], 12990);
  assert_eq!(product["stock"], 7);
  assert_eq!(product["specs"]["edad"], "10+");

  let url = product["image"].as_str().unwrap();
  assert!(url.ends_with(".png"));
  let key = url.rsplit('/').next().unwrap();
  let (stored_type, stored) = objects.get(key).unwrap();
  assert_eq!(stored_type, "image/png");
  assert_eq!(stored, PNG_BYTES);

  let req = test::TestRequest::get().uri(&format!("/api/products/{}", product["_id"].as_str().unwrap())).to_request();
  let fetched: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(fetched["sku"], "KIT-ROBO-01");
}

#[actix_web::test]
async fn non_image_upload_is_rejected_and_nothing_stored() {
  let (state, objects) = test_state_with_objects();
  let (_, admin_token) = seed_admin(&state).await;
  let app = test_app!(state);

  let (content_type, body) = multipart_body(&product_fields(), Some(("image", "notas.txt", "text/plain", &b"hola"[..])));
  let req = test::TestRequest::post()
    .uri("/api/products")
    .insert_header(bearer(&admin_token))
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(
    body["message"],
    "El archivo no es una imagen. Solo se permiten tipos de archivo de imagen."
  );
  assert!(objects.is_empty());
  assert!(state.store.list_products(None).await.unwrap().is_empty());
}

#[actix_web::test]
async fn product_form_reports_field_errors() {
  let state = test_state();
  let (_, admin_token) = seed_admin(&state).await;
  let app = test_app!(state);

  let (content_type, body) = multipart_body(&[("name", "Sin precio"), ("price", "-3")], None);
  let req = test::TestRequest::post()
    .uri("/api/products")
    .insert_header(bearer(&admin_token))
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["errors"][0]["field"], "price");
}

#[actix_web::test]
async fn catalog_writes_require_admin() {
  let state = test_state();
  let (_, token) = seed_customer(&state).await;
  let product = seed_product(&state, "Protoboard", 300, 10).await;
  let app = test_app!(state);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/products/{}", product.id))
    .insert_header(bearer(&token))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::get().uri("/api/products").to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn products_filter_by_category_and_delete() {
  let state = test_state();
  let (_, admin_token) = seed_admin(&state).await;
  let product = seed_product(&state, "Cautín", 4500, 3).await;
  let app = test_app!(state);

  let req = test::TestRequest::get().uri("/api/products?category=Electr%C3%B3nica").to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);

  let req = test::TestRequest::get().uri("/api/products?category=Rob%C3%B3tica").to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert!(listed.as_array().unwrap().is_empty());

  let req = test::TestRequest::delete()
    .uri(&format!("/api/products/{}", product.id))
    .insert_header(bearer(&admin_token))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["message"], "Producto eliminado");

  let req = test::TestRequest::get().uri(&format!("/api/products/{}", product.id)).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn category_names_are_unique() {
  let state = test_state();
  let (_, admin_token) = seed_admin(&state).await;
  let app = test_app!(state);

  let create = || {
    test::TestRequest::post()
      .uri("/api/categories")
      .insert_header(bearer(&admin_token))
      .set_json(json!({ "name": "Sensores", "description": "Sensores y módulos" }))
      .to_request()
  };
  assert_eq!(test::call_service(&app, create()).await.status(), StatusCode::CREATED);

  let resp = test::call_service(&app, create()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "La categoría ya existe");

  let req = test::TestRequest::get().uri("/api/categories").to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn search_matches_name_or_description() {
  let state = test_state();
  let wanted = seed_product_described(&state, "Módulo WiFi", "Incluye antena cerámica", 900, 5).await;
  seed_product_described(&state, "Pantalla LCD", "Pantalla de 16x2", 1100, 5).await;
  seed_service(&state, "Impresión 3D", "Piezas en PLA bajo pedido").await;
  let app = test_app!(state);

  let req = test::TestRequest::get().uri("/api/search?q=CER%C3%81MICA").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let products = body["products"].as_array().unwrap();
  assert_eq!(products.len(), 1);
  assert_eq!(products[0]["_id"], json!(wanted.id));
  assert!(body["services"].as_array().unwrap().is_empty());

  let req = test::TestRequest::get().uri("/api/search?q=pla").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["services"].as_array().unwrap().len(), 1);

  for uri in ["/api/search", "/api/search?q=%20%20"] {
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "El término de búsqueda es requerido");
  }
}

#[actix_web::test]
async fn export_returns_spreadsheet_attachment() {
  let state = test_state();
  let (_, admin_token) = seed_admin(&state).await;
  seed_product(&state, "Batería", 2000, 12).await;
  let app = test_app!(state);

  let req = test::TestRequest::get()
    .uri("/api/products/export")
    .insert_header(bearer(&admin_token))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers().get(header::CONTENT_TYPE).unwrap(),
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
  );
  let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
  assert!(disposition.contains("attachment"));
  let bytes = test::read_body(resp).await;
  assert_eq!(&bytes[..2], b"PK");
}
