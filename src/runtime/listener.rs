//! Per-address listener lifecycle.

use super::shutdown::{Readiness, Shutdown};
use crate::core::{PdsError, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Where a listener is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListenerState {
    /// Binding, or waiting on a readiness gate.
    Starting,
    /// Accepting connections.
    Serving,
    /// No longer accepting; in-flight calls are finishing.
    Draining,
    /// Done, either drained or forcibly closed.
    Stopped,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        })
    }
}

/// Observable handle on one listener.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    addr: Arc<str>,
    kind: &'static str,
    state: Arc<watch::Sender<ListenerState>>,
}

impl ListenerHandle {
    /// New handle in the `Starting` state.
    pub fn new(kind: &'static str, addr: impl Into<Arc<str>>) -> Self {
        let (state, _rx) = watch::channel(ListenerState::Starting);
        Self {
            addr: addr.into(),
            kind,
            state: Arc::new(state),
        }
    }

    /// Address this listener serves.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Current state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Waits until the listener has reached `state` or gone past it.
    pub async fn reached(&self, state: ListenerState) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|current| *current >= state).await;
    }

    pub(crate) fn set(&self, state: ListenerState) {
        self.state.send_replace(state);
        match state {
            ListenerState::Starting => {
                tracing::debug!(kind = self.kind, addr = %self.addr, "listener starting");
            },
            _ => {
                tracing::info!(kind = self.kind, addr = %self.addr, "listener {}", state);
            },
        }
    }
}

/// Binds `addr`. Failure here is fatal to the process.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| PdsError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Drives one listener through its states.
///
/// `server` must stop accepting once `shutdown` fires and then return when
/// in-flight work is done. If that takes longer than `grace`, the server
/// task is aborted; this is logged but is not an error.
pub(crate) async fn run_listener<F>(
    handle: ListenerHandle,
    shutdown: Shutdown,
    gate: Option<Readiness>,
    grace: Duration,
    server: F,
) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    if let Some(gate) = gate {
        if !gate.wait(&shutdown).await {
            handle.set(ListenerState::Stopped);
            return Ok(());
        }
    }

    handle.set(ListenerState::Serving);
    let mut task = tokio::spawn(server);

    let finished = tokio::select! {
        joined = &mut task => Some(joined),
        () = shutdown.wait() => None,
    };

    let result = match finished {
        Some(joined) => {
            let result = joined.unwrap_or_else(|e| Err(PdsError::Join(e)));
            if result.is_ok() {
                tracing::warn!(addr = %handle.addr(), "listener stopped unexpectedly");
            }
            result
        },
        None => {
            handle.set(ListenerState::Draining);
            match tokio::time::timeout(grace, &mut task).await {
                Ok(joined) => joined.unwrap_or_else(|e| Err(PdsError::Join(e))),
                Err(_) => {
                    task.abort();
                    let err = PdsError::ShutdownTimeout {
                        addr: handle.addr().to_string(),
                        timeout_ms: u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                    };
                    tracing::warn!("{}; forcing close", err);
                    Ok(())
                },
            }
        },
    };

    handle.set(ListenerState::Stopped);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::shutdown::ShutdownReason;

    #[tokio::test]
    async fn test_graceful_drain() {
        let handle = ListenerHandle::new("test", "127.0.0.1:0");
        let shutdown = Shutdown::new();
        let signal = shutdown.clone();
        let server = async move {
            signal.wait().await;
            Ok(())
        };

        let run = tokio::spawn(run_listener(
            handle.clone(),
            shutdown.clone(),
            None,
            Duration::from_secs(1),
            server,
        ));
        handle.reached(ListenerState::Serving).await;
        assert_eq!(handle.state(), ListenerState::Serving);

        shutdown.trigger(ShutdownReason::Cancelled);
        run.await.unwrap().unwrap();
        assert_eq!(handle.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_drain_timeout_is_not_fatal() {
        let handle = ListenerHandle::new("test", "127.0.0.1:0");
        let shutdown = Shutdown::new();
        let server = async {
            std::future::pending::<()>().await;
            Ok(())
        };

        shutdown.trigger(ShutdownReason::Cancelled);
        let result = run_listener(
            handle.clone(),
            shutdown,
            None,
            Duration::from_millis(20),
            server,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(handle.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_gate_blocks_serving() {
        let handle = ListenerHandle::new("test", "127.0.0.1:0");
        let shutdown = Shutdown::new();
        let gate = Readiness::new();
        let signal = shutdown.clone();
        let server = async move {
            signal.wait().await;
            Ok(())
        };

        let run = tokio::spawn(run_listener(
            handle.clone(),
            shutdown.clone(),
            Some(gate.clone()),
            Duration::from_secs(1),
            server,
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.state(), ListenerState::Starting);

        gate.open();
        handle.reached(ListenerState::Serving).await;
        shutdown.trigger(ShutdownReason::Cancelled);
        run.await.unwrap().unwrap();
        assert_eq!(handle.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let err = bind(&addr).await.unwrap_err();
        assert!(matches!(err, PdsError::Bind { .. }));
        assert!(err.is_fatal());
    }
}
