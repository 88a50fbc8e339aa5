//! Core building blocks shared by the backend and the gateway.

pub mod config;
pub mod envfmt;
pub mod error;
pub mod geo;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, GatewayConfig, ServerConfig};
pub use error::{PdsError, Result};
pub use geo::haversine;
