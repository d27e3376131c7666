#![allow(dead_code)]

use actix_web::{
    dev::{Service, ServiceResponse},
    http::header,
    test, web, App,
};
use serde_json::{json, Value};

use travelmate_api::{config::Settings, routes, state::AppState};

pub const PASSWORD: &str = "s3cret-pass";

pub fn create_app(
    settings: Settings,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = AppState::in_memory(settings).unwrap();
    App::new()
        .app_data(web::Data::new(state))
        .configure(routes::configure)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn sample_trip() -> Value {
    json!({
        "title": "Lisbon Spring",
        "destination": "Lisbon, Portugal",
        "start_date": "2026-05-10T00:00:00Z",
        "end_date": "2026-05-14T00:00:00Z",
        "budget": 500.0
    })
}

pub async fn register(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    email: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": email,
            "username": email.split('@').next().unwrap(),
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "registration of {} failed", email);
    let body: Value = test::read_body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

pub async fn create_trip(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    token: &str,
) -> Value {
    let req = test::TestRequest::post()
        .uri("/trips")
        .insert_header(bearer(token))
        .set_json(sample_trip())
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);
    test::read_body_json(resp).await
}
