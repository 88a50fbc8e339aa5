//! Storage for port records.
//!
//! A single [`PortStore`] is created at startup and shared by handle with
//! the query engine, the ingest pipeline and the RPC facade.

pub mod memory;

pub use memory::PortStore;
