//! Ingest of port records delivered as a stream.
//!
//! [`IngestPipeline`] consumes a client-streamed `RecordList` call and
//! upserts records in arrival order. It is not transactional: when the
//! stream fails, or a record without a location code arrives, the call is
//! aborted and every record stored before that point stays in place.
//!
//! [`loader`] is the producing side: it reads a JSON data file and feeds
//! a `RecordList` call on a backend.

pub mod loader;

use crate::core::{PdsError, Result};
use crate::proto::{Port, Summary};
use crate::storage::PortStore;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tonic::{Code, Status};

/// Applies a stream of records to the store.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    store: Arc<PortStore>,
}

impl IngestPipeline {
    /// Create a pipeline writing into `store`.
    pub fn new(store: Arc<PortStore>) -> Self {
        Self { store }
    }

    /// Drains `records`, upserting each under its first location code.
    ///
    /// Returns the number of records applied and the wall time of the call
    /// once the sender signals completion.
    pub async fn run<S>(&self, records: S) -> Result<Summary>
    where
        S: Stream<Item = std::result::Result<Port, Status>>,
    {
        let started = Instant::now();
        let mut count: i32 = 0;
        futures::pin_mut!(records);

        while let Some(record) = records.next().await {
            let port = record.map_err(|status| stream_error(count, status))?;
            if let Err(e) = self.store.insert(port) {
                tracing::warn!(count, "ingest aborted: {}", e);
                return Err(e);
            }
            count = count.saturating_add(1);
        }

        let elapsed_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
        tracing::info!(
            count,
            elapsed_ms,
            stored = self.store.len(),
            "ingest finished"
        );

        Ok(Summary {
            port_count: count,
            elapsed_time: elapsed_ms,
        })
    }
}

/// Caller cancellation and deadlines keep their status. Anything else the
/// stream yields means it could not be decoded.
fn stream_error(count: i32, status: Status) -> PdsError {
    tracing::warn!(count, code = ?status.code(), "ingest stream failed: {}", status.message());
    match status.code() {
        Code::Cancelled | Code::DeadlineExceeded => PdsError::Grpc(status),
        _ => PdsError::protocol(format!(
            "record stream broke after {count} records: {}",
            status.message()
        )),
    }
}
