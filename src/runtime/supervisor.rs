//! Owns the listener tasks of one process and waits for all of them.

use super::listener::{run_listener, ListenerHandle};
use super::shutdown::{Readiness, Shutdown, ShutdownReason};
use crate::core::{PdsError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;

/// Listener supervisor.
///
/// A listener that fails takes the others down: its error triggers
/// shutdown and is returned from [`wait`](Self::wait).
#[derive(Debug)]
pub struct Supervisor {
    shutdown: Shutdown,
    grace: Duration,
    tasks: JoinSet<Result<()>>,
    handles: Vec<ListenerHandle>,
}

impl Supervisor {
    /// Supervisor whose listeners drain for at most `grace` after `shutdown`.
    pub fn new(shutdown: Shutdown, grace: Duration) -> Self {
        Self {
            shutdown,
            grace,
            tasks: JoinSet::new(),
            handles: Vec::new(),
        }
    }

    /// The shutdown signal shared with every listener.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Handles of every listener spawned so far.
    pub fn handles(&self) -> &[ListenerHandle] {
        &self.handles
    }

    /// Start serving immediately.
    pub fn spawn<F>(&mut self, handle: ListenerHandle, server: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.spawn_inner(handle, None, server);
    }

    /// Start serving once `gate` opens.
    pub fn spawn_gated<F>(&mut self, handle: ListenerHandle, gate: Readiness, server: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.spawn_inner(handle, Some(gate), server);
    }

    fn spawn_inner<F>(&mut self, handle: ListenerHandle, gate: Option<Readiness>, server: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.handles.push(handle.clone());
        self.tasks.spawn(run_listener(
            handle,
            self.shutdown.clone(),
            gate,
            self.grace,
            server,
        ));
    }

    /// Blocks until every listener is stopped. Returns the first listener
    /// error, if any.
    pub async fn wait(mut self) -> Result<()> {
        let mut first: Option<PdsError> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let err = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => PdsError::Join(e),
            };
            tracing::error!(category = err.category(), "listener failed: {}", err);
            self.shutdown.trigger(ShutdownReason::Failure);
            first.get_or_insert(err);
        }

        tracing::info!(listeners = self.handles.len(), "all listeners stopped");
        first.map_or(Ok(()), Err)
    }
}
