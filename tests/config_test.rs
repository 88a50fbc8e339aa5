//! Configuration system tests.

use pds_lib::core::{envfmt, Config, ConfigBuilder, PdsError};
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::new().unwrap();
    assert_eq!(config.server.grpc_addrs, vec![":50051", ":50052"]);
    assert_eq!(config.server.shutdown_timeout, Duration::from_secs(15));
    assert_eq!(config.gateway.http_addrs, vec![":8008"]);
    assert_eq!(
        config.gateway.backend_addrs,
        vec!["localhost:50051", "localhost:50052"]
    );
    assert!(config.gateway.data_file.is_none());
    assert_eq!(config.gateway.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.gateway.max_body_bytes, 1 << 20);
    assert!(!config.debug);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .grpc_addrs(vec![":6001".to_string()])
        .http_addrs(vec!["127.0.0.1:9000".to_string(), "127.0.0.1:9001".to_string()])
        .backend_addrs(vec!["backend:6001".to_string()])
        .data_file("ports.json")
        .debug(true)
        .build()
        .unwrap();

    assert_eq!(config.server.grpc_addrs, vec![":6001"]);
    assert_eq!(config.gateway.http_addrs.len(), 2);
    assert_eq!(config.gateway.backend_addrs, vec!["backend:6001"]);
    assert_eq!(config.gateway.data_file.as_deref(), Some("ports.json"));
    assert!(config.debug);
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
server:
  grpc_addrs: [":7001", ":7002", ":7003"]
  shutdown_timeout: 1m
gateway:
  backend_addrs: ["a:7001", "b:7002"]
  ingest_timeout: 30s
  connect_timeout: 250ms
  max_body_bytes: 4096
"#;

    let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

    assert_eq!(config.server.grpc_addrs.len(), 3);
    assert_eq!(config.server.shutdown_timeout, Duration::from_secs(60));
    assert_eq!(config.gateway.backend_addrs, vec!["a:7001", "b:7002"]);
    assert_eq!(config.gateway.ingest_timeout, Duration::from_secs(30));
    assert_eq!(config.gateway.connect_timeout, Duration::from_millis(250));
    assert_eq!(config.gateway.max_body_bytes, 4096);
    assert_eq!(config.gateway.http_addrs, vec![":8008"]);
}

#[test]
fn test_yaml_survives_reserialization() {
    let config = ConfigBuilder::new()
        .data_file("$HOME/ports.json")
        .build()
        .unwrap();
    let yaml = serde_yaml::to_string(&config).unwrap();
    assert!(yaml.contains("call_timeout: 1s"));

    let reparsed = ConfigBuilder::new().from_yaml(&yaml).unwrap().build().unwrap();
    assert_eq!(reparsed.gateway.data_file, config.gateway.data_file);
    assert_eq!(reparsed.gateway.call_timeout, config.gateway.call_timeout);
    assert_eq!(reparsed.server.grpc_addrs, config.server.grpc_addrs);
}

#[test]
fn test_invalid_yaml() {
    let err = ConfigBuilder::new()
        .from_yaml("server:\n  shutdown_timeout: soon\n")
        .unwrap_err();
    assert!(matches!(err, PdsError::Config(_)));

    let err = ConfigBuilder::new().from_yaml("server: [1, 2").unwrap_err();
    assert!(err.to_string().contains("Failed to parse YAML config"));
}

#[test]
fn test_config_validation() {
    let empty_http = ConfigBuilder::new().http_addrs(Vec::new()).build();
    assert!(empty_http.is_err());

    let duplicate_http = ConfigBuilder::new()
        .http_addrs(vec![":8008".to_string(), ":8008".to_string()])
        .build()
        .unwrap_err();
    assert!(duplicate_http.to_string().contains("more than once"));
    assert!(duplicate_http.is_fatal());

    let mut config = Config::default();
    config.gateway.max_body_bytes = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.server.shutdown_timeout = Duration::ZERO;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("server.shutdown_timeout"));
}

#[test]
fn test_addresses_expand_environment() {
    std::env::set_var("PDS_TEST_BACKEND_PORT", "6100");
    assert_eq!(
        envfmt::backend_uri("localhost:${PDS_TEST_BACKEND_PORT}"),
        "http://localhost:6100"
    );
    assert_eq!(envfmt::listen_addr(":$PDS_TEST_BACKEND_PORT"), "0.0.0.0:6100");
    assert_eq!(envfmt::expand("%PDS_TEST_BACKEND_PORT%.json"), "6100.json");
}
