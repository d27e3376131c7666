mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{bearer, create_app, register};
use travelmate_api::config::Settings;

#[actix_rt::test]
async fn test_root() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({"message": "TravelMate API is running!"}));
}

#[actix_rt::test]
async fn test_health_reports_store_and_optional_services() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["database"]["status"], "ok");
    assert_eq!(body["services"]["weather"]["status"], "unconfigured");
}

#[actix_rt::test]
async fn test_favicon_is_empty() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get().uri("/favicon.ico").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);
}

#[actix_rt::test]
async fn test_weather_requires_auth_and_configuration() {
    let app = test::init_service(create_app(Settings::default())).await;

    let uri = "/weather/Lisbon?start_date=2026-05-10&end_date=2026-05-12";
    let req = test::TestRequest::get().uri(uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let token = register(&app, "ana@example.com").await;
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 503);

    let req = test::TestRequest::get()
        .uri("/weather/Lisbon?start_date=2026-05-10")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_rt::test]
async fn test_trip_room_rejects_missing_token() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get()
        .uri("/ws/65a1b2c3d4e5f6a7b8c9d0e1")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let token = register(&app, "ana@example.com").await;
    let req = test::TestRequest::get()
        .uri(&format!("/ws/65a1b2c3d4e5f6a7b8c9d0e1?token={}", token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}
