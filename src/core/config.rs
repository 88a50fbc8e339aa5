//! Configuration management for pds.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - CLI argument overrides
//! - Validation and defaults

use crate::core::{PdsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for pds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// gRPC backend configuration
    pub server: ServerConfig,
    /// HTTP gateway configuration
    pub gateway: GatewayConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// gRPC backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// One listener is started per address
    pub grpc_addrs: Vec<String>,
    /// Grace period for in-flight calls on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// HTTP gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// One HTTP listener is started per address
    pub http_addrs: Vec<String>,
    /// Backend addresses, balanced round robin
    pub backend_addrs: Vec<String>,
    /// Ports file streamed into the backend before serving
    pub data_file: Option<String>,
    /// Deadline for unary backend calls
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Deadline for the bulk load stream
    #[serde(with = "humantime_serde")]
    pub ingest_timeout: Duration,
    /// How long to wait for the backend to answer at startup
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Grace period for in-flight requests on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Maximum accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            grpc_addrs: vec![":50051".to_string(), ":50052".to_string()],
            shutdown_timeout: Duration::from_secs(15),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            http_addrs: vec![":8008".to_string()],
            backend_addrs: vec!["localhost:50051".to_string(), "localhost:50052".to_string()],
            data_file: None,
            call_timeout: Duration::from_secs(1),
            ingest_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(15),
            max_body_bytes: 1 << 20,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.grpc_addrs.is_empty() {
            return Err(PdsError::config("server.grpc_addrs must not be empty"));
        }
        check_unique("server.grpc_addrs", &self.server.grpc_addrs)?;
        if self.server.shutdown_timeout.is_zero() {
            return Err(PdsError::config("server.shutdown_timeout must be greater than 0"));
        }

        if self.gateway.http_addrs.is_empty() {
            return Err(PdsError::config("gateway.http_addrs must not be empty"));
        }
        check_unique("gateway.http_addrs", &self.gateway.http_addrs)?;
        if self.gateway.backend_addrs.is_empty() {
            return Err(PdsError::config("gateway.backend_addrs must not be empty"));
        }

        for (name, value) in [
            ("gateway.call_timeout", self.gateway.call_timeout),
            ("gateway.ingest_timeout", self.gateway.ingest_timeout),
            ("gateway.connect_timeout", self.gateway.connect_timeout),
            ("gateway.shutdown_timeout", self.gateway.shutdown_timeout),
        ] {
            if value.is_zero() {
                return Err(PdsError::config(format!("{name} must be greater than 0")));
            }
        }

        if self.gateway.max_body_bytes == 0 {
            return Err(PdsError::config("gateway.max_body_bytes must be greater than 0"));
        }

        Ok(())
    }

    /// Locate the configuration file when none was given explicitly.
    pub fn discover() -> Option<PathBuf> {
        [Path::new("config").join("pds.yaml"), PathBuf::from("pds.yaml")]
            .into_iter()
            .find(|path| path.exists())
    }
}

fn check_unique(field: &str, addrs: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for addr in addrs {
        if !seen.insert(addr.as_str()) {
            return Err(PdsError::config(format!("{field} lists {addr} more than once")));
        }
    }
    Ok(())
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| PdsError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set gRPC listen addresses
    pub fn grpc_addrs(mut self, addrs: Vec<String>) -> Self {
        self.config.server.grpc_addrs = addrs;
        self
    }

    /// Set HTTP listen addresses
    pub fn http_addrs(mut self, addrs: Vec<String>) -> Self {
        self.config.gateway.http_addrs = addrs;
        self
    }

    /// Set backend addresses
    pub fn backend_addrs(mut self, addrs: Vec<String>) -> Self {
        self.config.gateway.backend_addrs = addrs;
        self
    }

    /// Set bulk-load data file
    pub fn data_file(mut self, path: impl Into<String>) -> Self {
        self.config.gateway.data_file = Some(path.into());
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
