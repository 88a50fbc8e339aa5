//! End-to-end tests of the gRPC backend over real sockets.

mod common;

use common::{gulf_and_miami, names, TestBackend, TestPortBuilder};
use pds_lib::ingest::loader;
use pds_lib::proto::{Circle, Content, Key, Name, Point, Port, Quest};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;
use tokio_stream::StreamExt;

async fn loaded_backend() -> TestBackend {
    let backend = TestBackend::start().await;
    let mut client = backend.port_client().await;
    let summary = client
        .record_list(tokio_stream::iter(gulf_and_miami()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(summary.port_count, 4);
    backend
}

#[tokio::test]
async fn test_ping_echo() {
    let backend = TestBackend::start().await;
    let mut tool = backend.tool_client().await;

    let reply = tool
        .ping(Content {
            value: b"{\"ping\":1}".to_vec(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(reply.value, b"{\"ping\":1}".to_vec());

    backend.stop().await;
}

#[tokio::test]
async fn test_record_list_summary() {
    let backend = TestBackend::start().await;
    let mut client = backend.port_client().await;

    let summary = client
        .record_list(tokio_stream::iter(gulf_and_miami()))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(summary.port_count, 4);
    assert!(summary.elapsed_time >= 0);
    assert_eq!(backend.store.len(), 4);
    assert_eq!(backend.store.geo_count(), 4);

    // same keys again: size stays at the number of distinct keys
    let summary = client
        .record_list(tokio_stream::iter(gulf_and_miami()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(summary.port_count, 4);
    assert_eq!(backend.store.len(), 4);

    backend.stop().await;
}

#[tokio::test]
async fn test_record_list_rejects_record_without_unlocs() {
    let backend = TestBackend::start().await;
    let mut client = backend.port_client().await;

    let records = vec![
        common::dubai(),
        Port {
            name: "Nowhere".to_string(),
            ..Default::default()
        },
        common::miami(),
    ];
    let status = client
        .record_list(tokio_stream::iter(records))
        .await
        .unwrap_err();

    assert_eq!(status.code(), tonic::Code::InvalidArgument);
    assert!(backend.store.get("AEDXB").is_some());
    assert!(backend.store.get("USMIA").is_none());

    backend.stop().await;
}

#[tokio::test]
async fn test_set_then_get() {
    let backend = TestBackend::start().await;
    let mut client = backend.port_client().await;

    let port = TestPortBuilder::new("NLRTM", "Rotterdam").at(4.4, 51.92).build();
    let key = client.set_by_key(port.clone()).await.unwrap().into_inner();
    assert_eq!(key.value, "NLRTM");

    let found = client.get_by_key(key).await.unwrap().into_inner();
    assert_eq!(found, port);

    let found = client
        .get_by_name(Name {
            value: "Rotterdam".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(found.unlocs, vec!["NLRTM"]);

    backend.stop().await;
}

#[tokio::test]
async fn test_absent_key_is_empty_record() {
    let backend = TestBackend::start().await;
    let mut client = backend.port_client().await;

    let found = client
        .get_by_key(Key {
            value: "ZZZZZ".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(found, Port::default());

    let nearest = client.find_nearest(Point::new(10.0, 10.0)).await.unwrap().into_inner();
    assert_eq!(nearest, Port::default());

    backend.stop().await;
}

#[tokio::test]
async fn test_circle_around_gulf() {
    let backend = loaded_backend().await;
    let mut client = backend.port_client().await;

    let ports = client
        .find_in_circle(Circle {
            center: Some(Point::new(25.458_155, 55.148_621)),
            radius: 40_000.0,
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(names(&ports.list), vec!["Dubai", "Port Rashid", "Sharjah"]);

    backend.stop().await;
}

#[tokio::test]
async fn test_text_search() {
    let backend = loaded_backend().await;
    let mut client = backend.port_client().await;

    let ports = client.find_text(Quest::contains("dubai")).await.unwrap().into_inner();
    assert_eq!(names(&ports.list), vec!["Dubai", "Port Rashid"]);

    let ports = client.find_text(Quest::contains("flor")).await.unwrap().into_inner();
    assert_eq!(names(&ports.list), vec!["Miami"]);

    let ports = client
        .find_text(Quest {
            value: "dubai".to_string(),
            sensitive: true,
            whole: false,
        })
        .await
        .unwrap()
        .into_inner();
    assert!(ports.list.is_empty());

    backend.stop().await;
}

#[tokio::test]
async fn test_nearest() {
    let backend = loaded_backend().await;
    let mut client = backend.port_client().await;

    let nearest = client.find_nearest(Point::new(25.8, -80.2)).await.unwrap().into_inner();
    assert_eq!(nearest.name, "Miami");

    let nearest = client.find_nearest(Point::new(25.36, 55.39)).await.unwrap().into_inner();
    assert_eq!(nearest.name, "Sharjah");

    backend.stop().await;
}

#[tokio::test]
async fn test_bulk_load_object_file() {
    let backend = TestBackend::start().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut by_key = serde_json::Map::new();
    for port in gulf_and_miami() {
        by_key.insert(port.unlocs[0].clone(), serde_json::to_value(&port).unwrap());
    }
    let mut no_coords = TestPortBuilder::new("XXNOP", "Nowhere").build();
    no_coords.coordinates.clear();
    by_key.insert("XXNOP".to_string(), serde_json::to_value(&no_coords).unwrap());
    write!(file, "{}", serde_json::Value::Object(by_key)).unwrap();

    let summary = loader::bulk_load(
        backend.port_client().await,
        file.path(),
        Duration::from_secs(10),
    )
    .await
    .unwrap();

    assert_eq!(summary.port_count, 5);
    assert_eq!(backend.store.len(), 5);
    assert_eq!(backend.store.geo_count(), 4);

    backend.stop().await;
}

#[tokio::test]
async fn test_bulk_load_missing_file() {
    let backend = TestBackend::start().await;
    let dir = tempfile::tempdir().unwrap();

    let result = loader::bulk_load(
        backend.port_client().await,
        &dir.path().join("absent.json"),
        Duration::from_secs(10),
    )
    .await;
    assert!(result.is_err());

    backend.stop().await;
}

#[tokio::test]
async fn test_record_stream_deadline_keeps_applied_records() {
    let backend = TestBackend::start().await;

    // the sender never signals completion
    let records = tokio_stream::iter(gulf_and_miami()).chain(tokio_stream::pending());
    let err = loader::send_records(
        backend.port_client().await,
        records,
        Duration::from_millis(300),
    )
    .await
    .unwrap_err();

    let status: tonic::Status = err.into();
    assert_eq!(status.code(), tonic::Code::DeadlineExceeded);

    // records that arrived before the deadline are not rolled back
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while backend.store.len() < 4 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(backend.store.len(), 4);
    assert!(backend.store.get("USMIA").is_some());

    backend.stop().await;
}

#[tokio::test]
async fn test_record_stream_within_deadline() {
    let backend = TestBackend::start().await;

    let summary = loader::send_records(
        backend.port_client().await,
        tokio_stream::iter(gulf_and_miami()),
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    assert_eq!(summary.port_count, 4);

    backend.stop().await;
}
