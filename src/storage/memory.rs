//! In-memory port record store.
//!
//! Records live in a sharded concurrent map keyed by location code. Every
//! single-key operation is atomic. A scan visits the entries present shard
//! by shard and is not a snapshot: records written while a scan is running
//! may or may not be seen by it.

use crate::core::{PdsError, Result};
use crate::proto::Port;
use dashmap::DashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Concurrent mapping from location code to port record.
#[derive(Debug, Default)]
pub struct PortStore {
    /// Records indexed by `unlocs[0]`.
    ports: DashMap<String, Arc<Port>>,
    /// Total writes accepted since start.
    upserts: AtomicU64,
}

impl PortStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional overwrite, last write wins.
    pub fn upsert(&self, key: impl Into<String>, port: Port) {
        self.ports.insert(key.into(), Arc::new(port));
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Upsert under the record's own key. Records without a location code
    /// are rejected.
    pub fn insert(&self, port: Port) -> Result<String> {
        let key = port
            .key()
            .map(str::to_owned)
            .ok_or_else(|| missing_key(&port))?;
        self.upsert(key.clone(), port);
        Ok(key)
    }

    /// Look up a record by key.
    pub fn get(&self, key: &str) -> Option<Arc<Port>> {
        self.ports.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Visit every entry currently present, in unspecified order. The
    /// visitor stops the scan early by returning `ControlFlow::Break`.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Arc<Port>) -> ControlFlow<()>,
    {
        for entry in self.ports.iter() {
            if visitor(entry.value()).is_break() {
                break;
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True when no record has been stored.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Number of records that take part in geospatial queries.
    pub fn geo_count(&self) -> usize {
        let mut count = 0;
        self.for_each(|port| {
            if port.is_geo() {
                count += 1;
            }
            ControlFlow::Continue(())
        });
        count
    }

    /// Total upserts accepted, including overwrites.
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::Relaxed)
    }
}

fn missing_key(port: &Port) -> PdsError {
    if port.name.is_empty() {
        PdsError::invalid_port("port has no location code")
    } else {
        PdsError::invalid_port(format!("port '{}' has no location code", port.name))
    }
}
