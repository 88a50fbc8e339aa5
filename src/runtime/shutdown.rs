//! Process-wide stop signal and the readiness gate.

use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Why shutdown was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Requested from inside the process.
    Cancelled,
    /// A listener failed and took the rest down with it.
    Failure,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "interrupt",
            Self::Terminate => "termination",
            Self::Cancelled => "cancellation",
            Self::Failure => "listener failure",
        })
    }
}

/// Cloneable stop signal. Every clone observes the same trigger; only the
/// first trigger counts.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Trigger shutdown. Later calls are ignored.
    pub fn trigger(&self, reason: ShutdownReason) {
        if self.reason.set(reason).is_ok() {
            tracing::info!(%reason, "shutdown triggered");
            self.tx.send_replace(true);
        }
    }

    /// True once [`trigger`](Self::trigger) has been called.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// The reason given by the first trigger.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Trigger on SIGINT, or SIGTERM on unix. The task ends after the first
    /// signal or when shutdown is triggered some other way.
    pub fn listen_for_signals(&self) -> tokio::task::JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                reason = wait_for_signal() => shutdown.trigger(reason),
                () = shutdown.wait() => {},
            }
        })
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> ShutdownReason {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => tokio::select! {
            _ = tokio::signal::ctrl_c() => ShutdownReason::Interrupt,
            _ = term.recv() => ShutdownReason::Terminate,
        },
        Err(e) => {
            tracing::warn!("Cannot install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            ShutdownReason::Interrupt
        },
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> ShutdownReason {
    let _ = tokio::signal::ctrl_c().await;
    ShutdownReason::Interrupt
}

/// One-shot gate that dependent listeners wait on before serving.
#[derive(Debug, Clone)]
pub struct Readiness {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Open the gate. Opening twice is harmless.
    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    /// True once the gate has been opened.
    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits for the gate to open. Returns `false` if shutdown fires first.
    pub async fn wait(&self, shutdown: &Shutdown) -> bool {
        let mut rx = self.tx.subscribe();
        tokio::select! {
            biased;
            opened = rx.wait_for(|open| *open) => opened.is_ok(),
            () = shutdown.wait() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_first_reason_wins() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert_eq!(shutdown.reason(), None);

        shutdown.trigger(ShutdownReason::Terminate);
        shutdown.trigger(ShutdownReason::Interrupt);

        assert!(shutdown.is_triggered());
        assert_eq!(shutdown.reason(), Some(ShutdownReason::Terminate));
    }

    #[tokio::test]
    async fn test_wait_wakes_all_clones() {
        let shutdown = Shutdown::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let s = shutdown.clone();
                tokio::spawn(async move { s.wait().await })
            })
            .collect();

        shutdown.trigger(ShutdownReason::Cancelled);
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter woke")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownReason::Cancelled);
        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn test_readiness_opens() {
        let ready = Readiness::new();
        let shutdown = Shutdown::new();
        let gate = ready.clone();
        let s = shutdown.clone();
        let waiter = tokio::spawn(async move { gate.wait(&s).await });

        ready.open();
        assert!(waiter.await.unwrap());
        assert!(ready.is_open());
    }

    #[tokio::test]
    async fn test_readiness_gives_up_on_shutdown() {
        let ready = Readiness::new();
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownReason::Interrupt);
        assert!(!ready.wait(&shutdown).await);
    }
}
