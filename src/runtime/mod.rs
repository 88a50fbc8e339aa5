//! Listener lifecycle: start, serve, drain, stop.
//!
//! Every configured address gets its own listener, driven through
//! [`ListenerState`] by a [`Supervisor`]. A single [`Shutdown`] signal,
//! fired by SIGINT/SIGTERM or from code, stops them all; each then gets a
//! bounded grace period before it is forcibly closed. Listeners that must
//! not accept traffic until something upstream is ready wait on a
//! [`Readiness`] gate.

pub mod grpc;
pub mod listener;
pub mod shutdown;
pub mod supervisor;

pub use listener::{bind, ListenerHandle, ListenerState};
pub use shutdown::{Readiness, Shutdown, ShutdownReason};
pub use supervisor::Supervisor;
