//! Tests for the authentication handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::inbound::http::test_utils::{
    ADA, MockPorts, sample_user, session_cookie, sign_in, test_app, user_id,
};

#[rstest]
#[case(json!({"email": "", "password": "secret-pass", "name": "Ada"}), "email", "empty_email")]
#[case(json!({"email": "ada@example.com", "name": "Ada"}), "password", "empty_password")]
#[case(json!({"email": "ada@example.com", "password": "short", "name": "Ada"}), "password", "invalid_password_length")]
#[case(json!({"email": "nope", "password": "secret-pass", "name": "Ada"}), "email", "invalid_email")]
#[case(json!({"email": "ada@example.com", "password": "secret-pass", "name": " "}), "name", "empty_name")]
#[actix_web::test]
async fn register_rejects_invalid_payloads(
    #[case] body: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let app = test_app!(MockPorts::default(), configure);
    let req = actix_test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(body)
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn register_creates_the_account_and_signs_in() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_register()
        .withf(|registration| registration.email().as_ref() == "ada@example.com")
        .times(1)
        .return_once(|_| Ok(sample_user(ADA, "Ada")));
    ports
        .accounts
        .expect_find_user()
        .with(eq(user_id(ADA)))
        .return_once(|_| Ok(Some(sample_user(ADA, "Ada"))));
    let app = test_app!(ports, configure);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"email": "Ada@Example.com", "password": "secret-pass", "name": "Ada"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cookie = session_cookie(&res);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["id"], ADA);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/auth/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn register_surfaces_conflicts() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_register()
        .return_once(|_| Err(Error::conflict("email already registered")));
    let app = test_app!(ports, configure);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"email": "ada@example.com", "password": "secret-pass", "name": "Ada"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[case("", "secret-pass", "email")]
#[case("ada@example.com", "", "password")]
#[actix_web::test]
async fn login_requires_both_fields(
    #[case] email: &str,
    #[case] password: &str,
    #[case] field: &str,
) {
    let app = test_app!(MockPorts::default(), configure);
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn login_maps_bad_credentials_to_unauthorised() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_authenticate()
        .return_once(|_| Err(Error::unauthorized("invalid email or password")));
    let app = test_app!(ports, configure);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "ada@example.com", "password": "wrong-pass"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.response().cookies().all(|c| c.name() != "session"));
}

#[actix_web::test]
async fn login_sets_a_session_cookie() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_authenticate()
        .withf(|credentials| credentials.password() == "secret-pass")
        .return_once(|_| Ok(sample_user(ADA, "Ada")));
    let app = test_app!(ports, configure);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "ada@example.com", "password": "secret-pass"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!session_cookie(&res).value().is_empty());
}

#[actix_web::test]
async fn logout_clears_the_session() {
    let app = test_app!(MockPorts::default(), configure);
    let cookie = sign_in(&app, ADA).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(session_cookie(&res).value(), "");
}

#[actix_web::test]
async fn session_requires_login() {
    let app = test_app!(MockPorts::default(), configure);
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/auth/session").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn session_for_a_deleted_user_is_unauthorised() {
    let mut ports = MockPorts::default();
    ports.accounts.expect_find_user().return_once(|_| Ok(None));
    let app = test_app!(ports, configure);
    let cookie = sign_in(&app, ADA).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/auth/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
