//! pds - port database service.
//!
//! pds keeps an in-memory database of sea ports keyed by UN/LOCODE and
//! serves it over gRPC, with an HTTP/JSON gateway in front.
//!
//! # Features
//!
//! - **gRPC backend**: `pds.ToolGuide` and `pds.PortGuide` on any number of addresses
//! - **Queries**: exact key and name lookup, nearest port, ports in a circle, free text
//! - **Streaming ingest**: client-streamed record upload with a summary reply
//! - **HTTP gateway**: JSON routes under `/api/`, round robin across backends
//! - **Graceful lifecycle**: readiness gating and bounded drain on shutdown
//!
//! # Architecture
//!
//! - `storage`: concurrent record store
//! - `query`: read-only queries over the store
//! - `ingest`: streamed writes, and bulk load of JSON data files
//! - `service`: gRPC service implementations
//! - `runtime`: listener lifecycle and shutdown
//! - `gateway`: HTTP front end and backend client
//! - `core`: configuration, errors and shared helpers
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use pds_lib::runtime::{grpc, Shutdown, Supervisor};
//! use pds_lib::service::PortService;
//! use pds_lib::storage::PortStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> pds_lib::Result<()> {
//!     let shutdown = Shutdown::new();
//!     shutdown.listen_for_signals();
//!
//!     let service = PortService::new(Arc::new(PortStore::new()));
//!     let mut supervisor = Supervisor::new(shutdown, Duration::from_secs(15));
//!     grpc::spawn_listeners(&mut supervisor, &service, &[":50051".to_string()]).await?;
//!     supervisor.wait().await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod gateway;
pub mod ingest;
pub mod proto;
pub mod query;
pub mod runtime;
pub mod service;
pub mod storage;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
