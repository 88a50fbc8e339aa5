//! Error types for pds.

use thiserror::Error;

/// Every failure pds reports.
#[derive(Error, Debug)]
pub enum PdsError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed wire data
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A record that cannot be stored
    #[error("Invalid port record: {0}")]
    InvalidPort(String),

    /// A listen address could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address as configured
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// No backend could be reached
    #[error("Failed to dial {addr}: {message}")]
    Dial {
        /// Backend address or addresses
        addr: String,
        /// What went wrong
        message: String,
    },

    /// A listener was aborted after its grace period
    #[error("Listener {addr} did not drain within {timeout_ms}ms")]
    ShutdownTimeout {
        /// Listener address
        addr: String,
        /// Grace period that elapsed
        timeout_ms: u64,
    },

    /// Filesystem or socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML encoding or decoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// gRPC transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Status returned by a gRPC call
    #[error("GRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    /// A spawned task panicked or was cancelled
    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for pds operations
pub type Result<T> = std::result::Result<T, PdsError>;

impl PdsError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new protocol error
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a new invalid record error
    pub fn invalid_port<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPort(msg.into())
    }

    /// Creates a new dial error
    pub fn dial<A: Into<String>, S: Into<String>>(addr: A, msg: S) -> Self {
        Self::Dial {
            addr: addr.into(),
            message: msg.into(),
        }
    }

    /// Startup failures that must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Dial { .. } | Self::Config(_))
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Yaml(_) => "config",
            Self::Protocol(_) => "protocol",
            Self::InvalidPort(_) => "validation",
            Self::Bind { .. } | Self::Dial { .. } | Self::Transport(_) | Self::Grpc(_) => {
                "network"
            },
            Self::ShutdownTimeout { .. } => "shutdown",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Join(_) => "async",
        }
    }
}

impl From<PdsError> for tonic::Status {
    fn from(err: PdsError) -> Self {
        match err {
            PdsError::InvalidPort(msg) => tonic::Status::invalid_argument(msg),
            PdsError::Grpc(status) => status,
            other => tonic::Status::internal(other.to_string()),
        }
    }
}
