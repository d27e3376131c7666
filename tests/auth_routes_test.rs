mod common;

use actix_web::{http::header, test};
use serde_json::{json, Value};

use common::{bearer, create_app, register, PASSWORD};
use travelmate_api::config::Settings;

#[actix_rt::test]
async fn test_me_without_token_is_unauthorized() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get().uri("/auth/me").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    assert_eq!(
        resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Not authenticated");
}

#[actix_rt::test]
async fn test_garbage_token_is_unauthorized() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get()
        .uri("/trips")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Could not validate credentials");
}

#[actix_rt::test]
async fn test_register_login_and_me() {
    let app = test::init_service(create_app(Settings::default())).await;
    let token = register(&app, "Ana@Example.com").await;

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["email"], "ana@example.com");
    assert_eq!(me["username"], "Ana");
    assert!(me.get("hashed_password").is_none());

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "ana@example.com", "password": PASSWORD}))
        .to_request();
    let login: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(login["token_type"], "bearer");
    assert!(login["access_token"].as_str().is_some());
}

#[actix_rt::test]
async fn test_duplicate_registration_conflicts() {
    let app = test::init_service(create_app(Settings::default())).await;
    register(&app, "ana@example.com").await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": "ana@example.com",
            "username": "other",
            "password": "another-pass"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Email already registered");
}

#[actix_rt::test]
async fn test_login_failures_share_a_message() {
    let app = test::init_service(create_app(Settings::default())).await;
    register(&app, "ana@example.com").await;

    let mut details = Vec::new();
    for (email, password) in [
        ("ana@example.com", "wrong-pass"),
        ("nobody@example.com", PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        details.push(body["detail"].clone());
    }
    assert_eq!(details[0], details[1]);
}

#[actix_rt::test]
async fn test_malformed_body_is_bad_request() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());
}

#[actix_rt::test]
async fn test_update_profile_and_change_password() {
    let app = test::init_service(create_app(Settings::default())).await;
    let token = register(&app, "ana@example.com").await;

    let req = test::TestRequest::put()
        .uri("/auth/profile")
        .insert_header(bearer(&token))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::put()
        .uri("/auth/profile")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Ana Souza"}))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["name"], "Ana Souza");

    let req = test::TestRequest::put()
        .uri("/auth/change-password")
        .insert_header(bearer(&token))
        .set_json(json!({"current_password": "wrong", "new_password": "next-pass"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::put()
        .uri("/auth/change-password")
        .insert_header(bearer(&token))
        .set_json(json!({"current_password": PASSWORD, "new_password": "next-pass"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Password updated successfully");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "ana@example.com", "password": "next-pass"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_rt::test]
async fn test_password_reset_request_does_not_reveal_accounts() {
    let app = test::init_service(create_app(Settings::default())).await;
    register(&app, "ana@example.com").await;

    let mut messages = Vec::new();
    for email in ["ana@example.com", "nobody@example.com"] {
        let req = test::TestRequest::post()
            .uri("/auth/password-reset/request")
            .set_json(json!({ "email": email }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        messages.push(body["message"].clone());
    }
    assert_eq!(messages[0], messages[1]);
}

#[actix_rt::test]
async fn test_password_reset_confirm_rejects_unknown_token() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::post()
        .uri("/auth/password-reset/confirm")
        .set_json(json!({"token": "doesnotexist", "new_password": "next-pass"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Invalid or expired reset token");
}

#[actix_rt::test]
async fn test_password_reset_accepts_query_parameters() {
    let app = test::init_service(create_app(Settings::default())).await;
    register(&app, "ana@example.com").await;

    let req = test::TestRequest::post()
        .uri("/auth/password-reset/request?email=ana@example.com")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "Password reset email sent if the email is registered."
    );

    let req = test::TestRequest::post()
        .uri("/auth/password-reset/confirm?token=doesnotexist&new_password=next-pass")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Invalid or expired reset token");

    let req = test::TestRequest::post()
        .uri("/auth/password-reset/confirm")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_ne!(body["detail"], "Invalid or expired reset token");
}

#[actix_rt::test]
async fn test_unknown_auth_path_is_not_found() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get().uri("/auth/nope").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::put().uri("/auth/profile").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_rt::test]
async fn test_oauth_login_unconfigured_provider() {
    let app = test::init_service(create_app(Settings::default())).await;

    let req = test::TestRequest::get()
        .uri("/auth/oauth/google/login")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let req = test::TestRequest::get()
        .uri("/auth/oauth/myspace/login")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}
