// tests/community_tests.rs
#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::*;
use serde_json::{json, Value};
use techlab_server::models::{Project, Role};
use techlab_server::AppState;

async fn seed_project(state: &AppState, owner: uuid::Uuid) -> Project {
  let project = Project::new(
    owner,
    "Brazo robótico".to_string(),
    "Proyecto final del taller".to_string(),
    None,
  );
  state.store.insert_project(&project).await.unwrap();
  project
}

#[actix_web::test]
async fn like_toggles_back_and_forth() {
  let state = test_state();
  let (admin, _) = seed_admin(&state).await;
  let (customer, token) = seed_customer(&state).await;
  let project = seed_project(&state, admin.id).await;
  let app = test_app!(state);

  let like = || {
    test::TestRequest::put()
      .uri(&format!("/api/projects/{}/like", project.id))
      .insert_header(bearer(&token))
      .to_request()
  };

  let liked: Value = test::call_and_read_body_json(&app, like()).await;
  assert_eq!(liked["likes"], json!([customer.id]));

  let unliked: Value = test::call_and_read_body_json(&app, like()).await;
  assert_eq!(unliked["likes"], json!([]));

  let req = test::TestRequest::put()
    .uri(&format!("/api/projects/{}/like", uuid::Uuid::new_v4()))
    .insert_header(bearer(&token))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn comments_snapshot_author_name() {
  let state = test_state();
  let (admin, _) = seed_admin(&state).await;
  let (_, token) = seed_customer(&state).await;
  let project = seed_project(&state, admin.id).await;
  let app = test_app!(state);
  let uri = format!("/api/projects/{}/comment", project.id);

  let req = test::TestRequest::post()
    .uri(&uri)
    .insert_header(bearer(&token))
    .set_json(json!({ "text": "   " }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri(&uri)
    .insert_header(bearer(&token))
    .set_json(json!({ "text": "¡Excelente trabajo!" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let comments = body["comments"].as_array().unwrap();
  assert_eq!(comments.len(), 1);
  assert_eq!(comments[0]["name"], "Camila Cliente");
  assert_eq!(comments[0]["text"], "¡Excelente trabajo!");

  // Anonymous visitors can read but not comment.
  let req = test::TestRequest::post()
    .uri(&uri)
    .set_json(json!({ "text": "hola" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get().uri(&format!("/api/projects/{}", project.id)).to_request();
  let fetched: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(fetched["comments"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn project_creation_requires_title_and_description() {
  let state = test_state();
  let (_, admin_token) = seed_admin(&state).await;
  let app = test_app!(state);

  let (content_type, body) = multipart_body(&[("title", "Estación meteorológica")], None);
  let req = test::TestRequest::post()
    .uri("/api/projects")
    .insert_header(bearer(&admin_token))
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["errors"][0]["field"], "description");

  let (content_type, body) = multipart_body(
    &[("title", "Estación meteorológica"), ("description", "Sensores de clima con Arduino")],
    None,
  );
  let req = test::TestRequest::post()
    .uri("/api/projects")
    .insert_header(bearer(&admin_token))
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["likes"], json!([]));
}

#[actix_web::test]
async fn quotes_need_an_existing_service() {
  let state = test_state();
  let (_, admin_token) = seed_admin(&state).await;
  let service = seed_service(&state, "Corte láser", "Corte de acrílico y MDF").await;
  let app = test_app!(state);

  let quote = |service_id: uuid::Uuid| {
    test::TestRequest::post().uri("/api/quotes").set_json(json!({
      "serviceId": service_id,
      "name": "Mario",
      "email": "mario@correo.test",
      "message": "Necesito 20 piezas",
    }))
  };

  let resp = test::call_service(&app, quote(uuid::Uuid::new_v4()).to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Servicio no encontrado.");

  let resp = test::call_service(&app, quote(service.id).to_request()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Solicitud de cotización enviada con éxito.");

  let req = test::TestRequest::get().uri("/api/quotes").insert_header(bearer(&admin_token)).to_request();
  let quotes: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(quotes[0]["status"], "Nuevo");
  assert_eq!(quotes[0]["serviceName"], "Corte láser");

  let req = test::TestRequest::put()
    .uri(&format!("/api/quotes/{}/status", quotes[0]["_id"].as_str().unwrap()))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "status": "Contactado" }))
    .to_request();
  let updated: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(updated["status"], "Contactado");
}

#[actix_web::test]
async fn quote_form_reports_invalid_fields() {
  let state = test_state();
  let service = seed_service(&state, "Mantenimiento", "Revisión de equipos").await;
  let app = test_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/quotes")
    .set_json(json!({ "serviceId": service.id, "name": "", "email": "no-email", "message": "" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn profile_update_enforces_unique_email_and_nickname() {
  let state = test_state();
  let (_, token) = seed_customer(&state).await;
  let (mut other, _) = seed_user(&state, "Otra Persona", "otra@techlab.test", Role::School).await;
  other.nickname = Some("maker".to_string());
  state.store.update_user(&other).await.unwrap();
  let app = test_app!(state);

  let update = |fields: &[(&str, &str)]| {
    let (content_type, body) = multipart_body(fields, None);
    test::TestRequest::put()
      .uri("/api/profile")
      .insert_header(bearer(&token))
      .insert_header((header::CONTENT_TYPE, content_type))
      .set_payload(body)
      .to_request()
  };

  let resp = test::call_service(&app, update(&[("email", "OTRA@techlab.test")])).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Este email ya está registrado.");

  let resp = test::call_service(&app, update(&[("nickname", "maker")])).await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Este nickname ya está en uso.");

  let resp = test::call_service(&app, update(&[("name", "  ")])).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(&app, update(&[("name", "Camila R."), ("nickname", "cami")])).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["name"], "Camila R.");
  assert_eq!(body["nickname"], "cami");
  assert_eq!(body["email"], "camila@techlab.test");
}

#[actix_web::test]
async fn profile_picture_is_stored_under_user_prefix() {
  let (state, objects) = test_state_with_objects();
  let (customer, token) = seed_customer(&state).await;
  let app = test_app!(state);

  let (content_type, body) = multipart_body(&[], Some(("profilePicture", "yo.jpg", "image/jpeg", &b"\xff\xd8\xff"[..])));
  let req = test::TestRequest::put()
    .uri("/api/profile")
    .insert_header(bearer(&token))
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let url = body["profilePicture"].as_str().unwrap();
  let key = url.rsplit('/').next().unwrap();
  assert!(key.starts_with(&format!("profile-{}-", customer.id)));
  assert_eq!(objects.len(), 1);
}
