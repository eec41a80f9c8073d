// tests/checkout_tests.rs
#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use serde_json::{json, Value};
use techlab_server::models::Role;

fn add_to_cart(token: &str, product_id: uuid::Uuid, quantity: i32) -> test::TestRequest {
  test::TestRequest::post()
    .uri("/api/cart")
    .insert_header(bearer(token))
    .set_json(json!({ "productId": product_id, "quantity": quantity }))
}

fn checkout(token: &str) -> test::TestRequest {
  test::TestRequest::post().uri("/api/orders").insert_header(bearer(token))
}

#[actix_web::test]
async fn checkout_reserves_stock_and_clears_cart() {
  let state = test_state();
  let (customer, token) = seed_customer(&state).await;
  let product = seed_product(&state, "Raspberry Pi", 1000, 5).await;
  let app = test_app!(state);

  test::call_service(&app, add_to_cart(&token, product.id, 2).to_request()).await;

  let resp = test::call_service(&app, checkout(&token).to_request()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let order: Value = test::read_body_json(resp).await;
  assert_eq!(order["totalPriceCents"], 2000);
  assert_eq!(order["status"], "pending");
  assert_eq!(order["isPaid"], false);
  assert_eq!(order["user"], json!(customer.id));
  assert_eq!(order["items"][0]["name"], "Raspberry Pi");
  assert_eq!(order["items"][0]["quantity"], 2);

  let stored = state.store.find_product(product.id).await.unwrap().unwrap();
  assert_eq!(stored.stock, 3);
  assert!(state.store.find_cart(customer.id).await.unwrap().is_none());

  let req = test::TestRequest::get().uri("/api/orders/myorders").insert_header(bearer(&token)).to_request();
  let mine: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn checkout_uses_live_catalog_price() {
  let state = test_state();
  let (_, token) = seed_customer(&state).await;
  let mut product = seed_product(&state, "Impresora", 1000, 5).await;
  let app = test_app!(state);

  test::call_service(&app, add_to_cart(&token, product.id, 1).to_request()).await;
  product.price_cents = 1250;
  state.store.update_product(&product).await.unwrap();

  let order: Value = test::call_and_read_body_json(&app, checkout(&token).to_request()).await;
  assert_eq!(order["items"][0]["priceCents"], 1250);
  assert_eq!(order["totalPriceCents"], 1250);
}

#[actix_web::test]
async fn insufficient_stock_fails_whole_order() {
  let state = test_state();
  let (customer, token) = seed_customer(&state).await;
  let a = seed_product(&state, "Placa A", 500, 10).await;
  let b = seed_product(&state, "Placa B", 700, 1).await;
  let app = test_app!(state);

  test::call_service(&app, add_to_cart(&token, a.id, 2).to_request()).await;
  test::call_service(&app, add_to_cart(&token, b.id, 3).to_request()).await;

  let resp = test::call_service(&app, checkout(&token).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["message"].as_str().unwrap().contains("Placa B"));
  assert_eq!(body["productId"], json!(b.id));

  assert_eq!(state.store.find_product(a.id).await.unwrap().unwrap().stock, 10);
  assert_eq!(state.store.find_product(b.id).await.unwrap().unwrap().stock, 1);
  assert!(state.store.find_cart(customer.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn empty_cart_cannot_check_out() {
  let state = test_state();
  let (_, token) = seed_customer(&state).await;
  let app = test_app!(state);

  let resp = test::call_service(&app, checkout(&token).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "El carrito está vacío.");
}

#[actix_web::test]
async fn orders_are_private_to_owner_and_admins() {
  let state = test_state();
  let (_, token) = seed_customer(&state).await;
  let (_, other_token) = seed_user(&state, "Otro Cliente", "otro@techlab.test", Role::Customer).await;
  let (_, admin_token) = seed_admin(&state).await;
  let product = seed_product(&state, "Multímetro", 3000, 4).await;
  let app = test_app!(state);

  test::call_service(&app, add_to_cart(&token, product.id, 1).to_request()).await;
  let order: Value = test::call_and_read_body_json(&app, checkout(&token).to_request()).await;
  let uri = format!("/api/orders/{}", order["_id"].as_str().unwrap());

  let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&other_token)).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "No autorizado para ver esta orden");

  let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&token)).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&admin_token)).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn status_changes_follow_the_order_lifecycle() {
  let state = test_state();
  let (_, token) = seed_customer(&state).await;
  let (_, admin_token) = seed_admin(&state).await;
  let product = seed_product(&state, "Osciloscopio", 9000, 2).await;
  let app = test_app!(state);

  test::call_service(&app, add_to_cart(&token, product.id, 1).to_request()).await;
  let order: Value = test::call_and_read_body_json(&app, checkout(&token).to_request()).await;
  let uri = format!("/api/orders/{}/status", order["_id"].as_str().unwrap());
  let set_status = |auth: &str, status: &str| {
    test::TestRequest::put()
      .uri(&uri)
      .insert_header(bearer(auth))
      .set_json(json!({ "status": status }))
      .to_request()
  };

  // Customers cannot move orders.
  let resp = test::call_service(&app, set_status(&token, "completed")).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = test::call_service(&app, set_status(&admin_token, "in-progress")).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = test::call_service(&app, set_status(&admin_token, "completed")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "completed");
  assert_eq!(body["isPaid"], true);
  assert!(body["paidAt"].is_string());

  let resp = test::call_service(&app, set_status(&admin_token, "pending")).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(&app, set_status(&admin_token, "shipped")).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
