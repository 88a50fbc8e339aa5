//! RPC client the gateway uses to reach its backends.

use crate::core::envfmt;
use crate::core::{PdsError, Result};
use crate::proto::{Content, PortGuideClient, ToolGuideClient};
use std::time::{Duration, Instant};
use tonic::transport::{Channel, Endpoint};

/// Pause between readiness probes.
const PROBE_INTERVAL: Duration = Duration::from_millis(200);

/// Clients for both services over one channel that round-robins across
/// every configured backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    addrs: Vec<String>,
    tool: ToolGuideClient<Channel>,
    port: PortGuideClient<Channel>,
}

impl BackendClient {
    /// Build the balanced channel. No connection is made yet.
    pub fn new(addrs: &[String]) -> Result<Self> {
        if addrs.is_empty() {
            return Err(PdsError::config("no backend addresses configured"));
        }

        let mut endpoints = Vec::with_capacity(addrs.len());
        let mut uris = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let uri = envfmt::backend_uri(addr);
            let endpoint = Endpoint::from_shared(uri.clone())
                .map_err(|e| PdsError::dial(uri.clone(), e.to_string()))?;
            endpoints.push(endpoint);
            uris.push(uri);
        }

        let channel = Channel::balance_list(endpoints.into_iter());
        Ok(Self {
            addrs: uris,
            tool: ToolGuideClient::new(channel.clone()),
            port: PortGuideClient::new(channel),
        })
    }

    /// Backend URIs behind the channel.
    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    /// `pds.ToolGuide` client.
    pub fn tool(&self) -> ToolGuideClient<Channel> {
        self.tool.clone()
    }

    /// `pds.PortGuide` client.
    pub fn port(&self) -> PortGuideClient<Channel> {
        self.port.clone()
    }

    /// Probes the backends with `Ping` until one answers or `timeout`
    /// elapses. Giving up is a fatal dial error.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        let joined = self.addrs.join(",");
        tracing::info!(backends = %joined, "connecting to backend");

        loop {
            let remaining = timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(PdsError::dial(
                    joined,
                    format!("no backend answered within {}ms", timeout.as_millis()),
                ));
            }

            let mut request = tonic::Request::new(Content::default());
            request.set_timeout(remaining);
            match tokio::time::timeout(remaining, self.tool().ping(request)).await {
                Ok(Ok(_)) => {
                    tracing::info!(backends = %joined, "backend connected");
                    return Ok(());
                },
                Ok(Err(status)) => {
                    tracing::debug!("backend probe failed: {}", status.message());
                },
                Err(_) => {
                    tracing::debug!("backend probe timed out");
                },
            }
            tokio::time::sleep(PROBE_INTERVAL.min(timeout.saturating_sub(started.elapsed())))
                .await;
        }
    }
}
