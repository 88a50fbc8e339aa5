//! HTTP gateway tests, driving the router in-process against a live backend.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{gulf_and_miami, names, TestBackend};
use pds_lib::gateway::{self, AjaxErrorBody, BackendClient, GatewayState};
use pds_lib::proto::{Key, Port, Ports};
use pds_lib::runtime::{Shutdown, ShutdownReason};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tower::ServiceExt;

const MAX_BODY: usize = 64 * 1024;

fn app_for(addrs: &[String], shutdown: &Shutdown) -> Router {
    let backend = BackendClient::new(addrs).unwrap();
    let state = GatewayState::new(backend, Duration::from_millis(500), shutdown.clone());
    gateway::router(state, MAX_BODY)
}

async fn post(app: &Router, path: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn error_body(bytes: &[u8]) -> AjaxErrorBody {
    serde_json::from_slice(bytes).expect("error body")
}

async fn loaded() -> (TestBackend, Router, Shutdown) {
    let backend = TestBackend::start().await;
    for port in gulf_and_miami() {
        backend.store.insert(port).unwrap();
    }
    let shutdown = Shutdown::new();
    let app = app_for(&[backend.uri()], &shutdown);
    (backend, app, shutdown)
}

#[tokio::test]
async fn test_ping_echoes_raw_body() {
    let (backend, app, _shutdown) = loaded().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tool/ping")
                .body(Body::from(r#"{"any":"thing"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert!(response.headers()[header::SERVER]
        .to_str()
        .unwrap()
        .starts_with("pds-gateway/"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], br#"{"any":"thing"}"#);

    backend.stop().await;
}

#[tokio::test]
async fn test_set_and_get_roundtrip() {
    let (backend, app, _shutdown) = loaded().await;

    let body = r#"{"name":"Rotterdam","unlocs":["NLRTM"],"coordinates":[4.4,51.92]}"#;
    let (status, bytes) = post(&app, "/api/port/set", body).await;
    assert_eq!(status, StatusCode::OK);
    let key: Key = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(key.value, "NLRTM");

    let (status, bytes) = post(&app, "/api/port/get", r#"{"value":"NLRTM"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let port: Port = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(port.name, "Rotterdam");

    backend.stop().await;
}

#[tokio::test]
async fn test_queries() {
    let (backend, app, _shutdown) = loaded().await;

    let (status, bytes) = post(&app, "/api/port/name", r#"{"value":"Sharjah"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Port>(&bytes).unwrap().unlocs, vec!["AESHJ"]);

    let (status, bytes) =
        post(&app, "/api/port/near", r#"{"latitude":25.8,"longitude":-80.2}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Port>(&bytes).unwrap().name, "Miami");

    let circle = r#"{"center":{"latitude":25.458155,"longitude":55.148621},"radius":40000}"#;
    let (status, bytes) = post(&app, "/api/port/circle", circle).await;
    assert_eq!(status, StatusCode::OK);
    let ports: Ports = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(names(&ports.list), vec!["Dubai", "Port Rashid", "Sharjah"]);

    let (status, bytes) = post(&app, "/api/port/text", r#"{"value":"dubai"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let ports: Ports = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(names(&ports.list), vec!["Dubai", "Port Rashid"]);

    backend.stop().await;
}

#[tokio::test]
async fn test_body_errors() {
    let (backend, app, _shutdown) = loaded().await;

    let (status, bytes) = post(&app, "/api/port/get", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err = error_body(&bytes);
    assert_eq!(err.code, 2);
    assert_eq!(err.what, "data not given");
    assert!(err.when > 0);

    let (status, bytes) = post(&app, "/api/port/get", "{nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&bytes).code, 3);

    backend.stop().await;
}

#[tokio::test]
async fn test_argument_checks() {
    let (backend, app, _shutdown) = loaded().await;

    let cases = [
        ("/api/port/set", r#"{"name":"No code"}"#, 5),
        ("/api/port/set", r#"{"unlocs":["XXNON"]}"#, 5),
        ("/api/port/get", r#"{"value":""}"#, 7),
        ("/api/port/name", r#"{}"#, 9),
        ("/api/port/near", r#"{"latitude":0,"longitude":0}"#, 11),
        ("/api/port/circle", r#"{"radius":1000}"#, 13),
        ("/api/port/circle", r#"{"center":{"latitude":1,"longitude":1},"radius":0}"#, 13),
        ("/api/port/text", r#"{"sensitive":true}"#, 15),
    ];
    for (path, body, code) in cases {
        let (status, bytes) = post(&app, path, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path} {body}");
        assert_eq!(error_body(&bytes).code, code, "{path} {body}");
    }
    assert!(backend.store.get("XXNON").is_none());

    backend.stop().await;
}

#[tokio::test]
async fn test_backend_failure_is_500() {
    // nothing listens here
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let shutdown = Shutdown::new();
    let app = app_for(&[addr], &shutdown);

    let (status, bytes) = post(&app, "/api/port/get", r#"{"value":"AEDXB"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(&bytes).code, 8);

    let (status, bytes) = post(&app, "/api/tool/ping", "{}").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(&bytes).code, 4);
}

#[tokio::test]
async fn test_set_overwrites_existing_key() {
    let (backend, app, _shutdown) = loaded().await;

    let (status, bytes) = post(&app, "/api/port/set", r#"{"name":"x","unlocs":["AEDXB"]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Key>(&bytes).unwrap().value, "AEDXB");
    assert_eq!(backend.store.get("AEDXB").unwrap().name, "x");

    backend.stop().await;
}

#[tokio::test]
async fn test_refuses_after_shutdown() {
    let (backend, app, shutdown) = loaded().await;
    shutdown.trigger(ShutdownReason::Cancelled);

    let (status, _) = post(&app, "/api/port/get", r#"{"value":"AEDXB"}"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    backend.stop().await;
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let (backend, app, _shutdown) = loaded().await;

    let value = "x".repeat(MAX_BODY + 1);
    let body = format!(r#"{{"value":"{value}"}}"#);
    let (status, _) = post(&app, "/api/port/text", body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    backend.stop().await;
}
