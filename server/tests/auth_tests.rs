// tests/auth_tests.rs
#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use serde_json::{json, Value};

fn register(body: Value) -> test::TestRequest {
  test::TestRequest::post().uri("/api/users/register").set_json(body)
}

fn login(email: &str, password: &str) -> test::TestRequest {
  test::TestRequest::post()
    .uri("/api/users/login")
    .set_json(json!({ "email": email, "password": password }))
}

#[actix_web::test]
async fn register_returns_token_and_customer_role() {
  let state = test_state();
  let app = test_app!(state);

  let resp = test::call_service(
    &app,
    register(json!({ "name": "Lucía", "email": "  Lucia@TechLab.test ", "password": "secreto1" })).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["email"], "lucia@techlab.test");
  assert_eq!(body["role"], "cliente");
  assert!(!body["token"].as_str().unwrap().is_empty());
  assert!(body.get("passwordHash").is_none());

  let req = test::TestRequest::get()
    .uri("/api/users/me")
    .insert_header(bearer(body["token"].as_str().unwrap()))
    .to_request();
  let me: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(me["_id"], body["_id"]);
  assert_eq!(me["name"], "Lucía");
}

#[actix_web::test]
async fn register_never_grants_admin() {
  let state = test_state();
  let app = test_app!(state);

  let body: Value = test::call_and_read_body_json(
    &app,
    register(json!({ "name": "Intruso", "email": "intruso@techlab.test", "password": "x1", "role": "admin" }))
      .to_request(),
  )
  .await;
  assert_eq!(body["role"], "cliente");

  let body: Value = test::call_and_read_body_json(
    &app,
    register(json!({ "name": "Colegio", "email": "colegio@techlab.test", "password": "x1", "role": "escuela" }))
      .to_request(),
  )
  .await;
  assert_eq!(body["role"], "escuela");
}

#[actix_web::test]
async fn register_rejects_duplicates_and_missing_fields() {
  let state = test_state();
  seed_customer(&state).await;
  let app = test_app!(state);

  let resp = test::call_service(
    &app,
    register(json!({ "name": "Camila", "email": "CAMILA@techlab.test", "password": "otra" })).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "El usuario ya existe");

  let resp = test::call_service(&app, register(json!({ "email": "nuevo@techlab.test" })).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Por favor, completa todos los campos");

  let resp = test::call_service(
    &app,
    register(json!({ "name": "Sin arroba", "email": "sin-arroba", "password": "x1" })).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_checks_credentials() {
  let state = test_state();
  let (user, _) = seed_customer(&state).await;
  let app = test_app!(state);

  let resp = test::call_service(&app, login("camila@techlab.test", PASSWORD).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["_id"], json!(user.id));
  assert!(body["token"].is_string());

  for (email, password) in [("camila@techlab.test", "incorrecta"), ("nadie@techlab.test", PASSWORD), ("", "")] {
    let resp = test::call_service(&app, login(email, password).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Credenciales inválidas");
  }
}

#[actix_web::test]
async fn protected_routes_require_a_valid_token() {
  let state = test_state();
  let app = test_app!(state);

  let req = test::TestRequest::get().uri("/api/users/me").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "No autorizado, no hay token");

  let req = test::TestRequest::get()
    .uri("/api/users/me")
    .insert_header(bearer("no-es-un-jwt"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn user_admin_routes_are_admin_only() {
  let state = test_state();
  let (customer, customer_token) = seed_customer(&state).await;
  let (_, admin_token) = seed_admin(&state).await;
  let app = test_app!(state);

  let req = test::TestRequest::get().uri("/api/users").insert_header(bearer(&customer_token)).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "No autorizado. Solo administradores.");

  let req = test::TestRequest::get().uri("/api/users").insert_header(bearer(&admin_token)).to_request();
  let users: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(users.as_array().unwrap().len(), 2);

  let req = test::TestRequest::post()
    .uri("/api/users")
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "name": "Editor", "email": "editor@techlab.test", "password": "x1", "role": "admin" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["role"], "admin");

  let req = test::TestRequest::delete()
    .uri(&format!("/api/users/{}", customer.id))
    .insert_header(bearer(&admin_token))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["message"], "Usuario eliminado");

  // The deleted user's token no longer resolves to anyone.
  let req = test::TestRequest::get().uri("/api/users/me").insert_header(bearer(&customer_token)).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}
