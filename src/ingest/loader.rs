//! Bulk load of a JSON port file into a backend.
//!
//! The file is read incrementally: each record is handed to the
//! `RecordList` stream as soon as it has been parsed, so the whole file is
//! never held in memory. Two layouts are accepted at the top level:
//!
//! ```json
//! [ { "name": "Dubai", "unlocs": ["AEDXB"], ... }, ... ]
//! { "AEDXB": { "name": "Dubai", "unlocs": ["AEDXB"], ... }, ... }
//! ```
//!
//! Object keys are ignored; the store key always comes from `unlocs`.

use crate::core::{PdsError, Result};
use crate::proto::{Port, PortGuideClient, Summary};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Code, Status};

/// Records buffered between the file reader and the RPC stream.
const CHANNEL_DEPTH: usize = 256;

/// Parses port records from `reader`, handing each to `on_port` in file
/// order. Returns how many records were handed over.
///
/// `on_port` may stop the read early with `ControlFlow::Break`; this is
/// reported as a serialization error since the remainder of the input was
/// not consumed.
pub fn read_ports<R, F>(reader: R, on_port: F) -> Result<usize>
where
    R: Read,
    F: FnMut(Port) -> ControlFlow<()>,
{
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let count = PortSink { on_port }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(count)
}

struct PortSink<F> {
    on_port: F,
}

impl<'de, F> DeserializeSeed<'de> for PortSink<F>
where
    F: FnMut(Port) -> ControlFlow<()>,
{
    type Value = usize;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for PortSink<F>
where
    F: FnMut(Port) -> ControlFlow<()>,
{
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array or an object of port records")
    }

    fn visit_seq<A>(mut self, mut seq: A) -> std::result::Result<usize, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(port) = seq.next_element::<Port>()? {
            count += 1;
            if (self.on_port)(port).is_break() {
                return Err(de::Error::custom(format!("load stopped after {count} records")));
            }
        }
        Ok(count)
    }

    fn visit_map<A>(mut self, mut map: A) -> std::result::Result<usize, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut count = 0;
        while let Some((_, port)) = map.next_entry::<String, Port>()? {
            count += 1;
            if (self.on_port)(port).is_break() {
                return Err(de::Error::custom(format!("load stopped after {count} records")));
            }
        }
        Ok(count)
    }
}

/// Streams the records of `path` into a `RecordList` call on `client`.
///
/// The call carries `deadline`. Records without exactly two coordinates are
/// logged and still sent; they simply take no part in geo queries.
pub async fn bulk_load(
    client: PortGuideClient<Channel>,
    path: &Path,
    deadline: Duration,
) -> Result<Summary> {
    let (tx, rx) = mpsc::channel::<Port>(CHANNEL_DEPTH);
    let file: PathBuf = path.to_path_buf();

    tracing::info!("Bulk loading ports from {}", file.display());
    let reader = tokio::task::spawn_blocking(move || -> Result<usize> {
        let handle = File::open(&file).map_err(|e| {
            PdsError::config(format!("Failed to open data file {}: {}", file.display(), e))
        })?;
        read_ports(BufReader::new(handle), |port| {
            if !port.is_geo() {
                tracing::warn!(
                    key = port.key().unwrap_or_default(),
                    coordinates = port.coordinates.len(),
                    "port has no usable coordinates"
                );
            }
            match tx.blocking_send(port) {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            }
        })
    });

    let call = send_records(client, ReceiverStream::new(rx), deadline);
    let (read, call) = tokio::join!(reader, call);

    // A failed call closes the channel and stops the reader, so the call
    // error is the one worth reporting.
    let summary = call?;
    let sent = read??;

    tracing::info!(
        ports = summary.port_count,
        sent,
        elapsed_ms = summary.elapsed_time,
        "bulk load finished"
    );
    Ok(summary)
}

/// Sends `records` as one `RecordList` call bounded by `deadline`.
///
/// An expired deadline is reported as `DeadlineExceeded`. Records the
/// backend applied before that stay applied.
pub async fn send_records<S>(
    mut client: PortGuideClient<Channel>,
    records: S,
    deadline: Duration,
) -> Result<Summary>
where
    S: Stream<Item = Port> + Send + 'static,
{
    let mut request = tonic::Request::new(records);
    request.set_timeout(deadline);
    let started = Instant::now();

    let reply = match tokio::time::timeout(deadline, client.record_list(request)).await {
        Ok(reply) => reply,
        Err(_) => Err(Status::cancelled("deadline elapsed")),
    };
    match reply {
        Ok(summary) => Ok(summary.into_inner()),
        // the server reports its own timer firing as a cancellation
        Err(status) if status.code() == Code::Cancelled && started.elapsed() >= deadline => {
            Err(PdsError::Grpc(Status::deadline_exceeded(format!(
                "record stream not finished within {}ms",
                deadline.as_millis()
            ))))
        },
        Err(status) => Err(status.into()),
    }
}
