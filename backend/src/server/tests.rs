//! Tests for server wiring: readiness signalling and the assembled app.

use super::*;
use actix_web::http::{StatusCode, header};
use actix_web::test as actix_test;
use codetok::AppSettings;
use codetok::domain::TRACE_ID_HEADER;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

#[fixture]
fn blob_root() -> TempDir {
    TempDir::new().expect("temp blob root")
}

fn memory_config(blob_root: &TempDir) -> ServerConfig {
    let settings = AppSettings {
        blob_root: Some(blob_root.path().to_path_buf()),
        ..AppSettings::default()
    };
    ServerConfig::new(
        Key::generate(),
        false,
        SameSite::Lax,
        "127.0.0.1:0".parse().expect("socket address"),
        settings,
    )
}

#[rstest]
#[actix_web::test]
async fn create_server_marks_ready(blob_root: TempDir) {
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), memory_config(&blob_root))
        .expect("server should start");
    assert!(health_state.is_ready());
    server.handle().stop(false).await;
}

#[rstest]
#[actix_web::test]
async fn assembled_app_serves_sessions_and_probes(blob_root: TempDir) {
    let config = memory_config(&blob_root);
    let http_state = build_http_state(&config).expect("state");
    let health_state = web::Data::new(HealthState::new());
    health_state.mark_ready();
    let app = actix_test::init_service(build_app(AppDependencies {
        health_state,
        http_state,
        key: config.key.clone(),
        cookie_secure: false,
        same_site: SameSite::Lax,
        upload_limit: config.settings.upload_limit(),
    }))
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": "ada@example.com",
                "password": "correct horse",
                "name": "Ada"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned();

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/auth/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["email"], "ada@example.com");
}

#[rstest]
#[actix_web::test]
async fn generation_without_a_model_is_unavailable(blob_root: TempDir) {
    let config = memory_config(&blob_root);
    let app = actix_test::init_service(build_app(AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: build_http_state(&config).expect("state"),
        key: config.key.clone(),
        cookie_secure: false,
        same_site: SameSite::Lax,
        upload_limit: config.settings.upload_limit(),
    }))
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/ai/generate")
            .set_json(json!({"prompt": "a clock"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
}
