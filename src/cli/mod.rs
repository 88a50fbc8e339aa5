//! Command-line interface for pds.
//!
//! `pds server` runs the RPC backend, `pds gateway` runs the HTTP gateway
//! in front of it, and `pds check-config` prints the effective settings.

use crate::core::{Config, ConfigBuilder, PdsError, Result};
use crate::gateway;
use crate::runtime::{self, Shutdown, Supervisor};
use crate::service::PortService;
use crate::storage::PortStore;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Port database service: gRPC backend and HTTP gateway.
#[derive(Parser, Debug)]
#[command(name = "pds")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ./config/pds.yaml, then ./pds.yaml)
    #[arg(short, long, global = true, env = "PDS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, env = "PDS_DEBUG")]
    pub debug: bool,

    /// What to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the gRPC backend
    Server(ServerArgs),
    /// Run the HTTP gateway
    Gateway(GatewayArgs),
    /// Validate the configuration, print it and exit
    CheckConfig,
}

/// Overrides for `pds server`.
#[derive(Args, Debug, Default)]
pub struct ServerArgs {
    /// gRPC listen address, repeatable (e.g. `:50051`)
    #[arg(long = "listen")]
    pub listen: Vec<String>,
}

/// Overrides for `pds gateway`.
#[derive(Args, Debug, Default)]
pub struct GatewayArgs {
    /// HTTP listen address, repeatable (e.g. `:8008`)
    #[arg(long = "listen")]
    pub listen: Vec<String>,

    /// Backend address, repeatable (e.g. `localhost:50051`)
    #[arg(long = "backend")]
    pub backend: Vec<String>,

    /// JSON file of ports to load into the backend before serving
    #[arg(long)]
    pub data_file: Option<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. Command-line flags
    /// 2. Config file (`--config`, `PDS_CONFIG`, or a discovered default)
    /// 3. Built-in defaults
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => Config::discover(),
        };
        let contents = match path {
            Some(path) => read_config(&path, self.config.is_some()).await?,
            None => None,
        };
        match contents {
            Some(yaml) if !yaml.trim().is_empty() => builder = builder.from_yaml(&yaml)?,
            _ => tracing::debug!("No config file found, using defaults"),
        }

        self.apply_overrides(builder).build()
    }

    fn apply_overrides(&self, mut builder: ConfigBuilder) -> ConfigBuilder {
        match &self.command {
            Command::Server(args) if !args.listen.is_empty() => {
                builder = builder.grpc_addrs(args.listen.clone());
            },
            Command::Gateway(args) => {
                if !args.listen.is_empty() {
                    builder = builder.http_addrs(args.listen.clone());
                }
                if !args.backend.is_empty() {
                    builder = builder.backend_addrs(args.backend.clone());
                }
                if let Some(file) = &args.data_file {
                    builder = builder.data_file(file.clone());
                }
            },
            _ => {},
        }
        builder.debug(self.debug)
    }

    /// Initialize logging. `--debug` wins over `PDS_LOG_LEVEL`, which wins
    /// over `RUST_LOG`.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = if self.debug {
            EnvFilter::new("debug")
        } else if let Ok(level) = std::env::var("PDS_LOG_LEVEL") {
            EnvFilter::try_new(&level)
                .map_err(|e| PdsError::config(format!("Invalid PDS_LOG_LEVEL '{}': {}", level, e)))?
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(self.debug)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| PdsError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

async fn read_config(path: &Path, explicit: bool) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            tracing::info!("Loaded configuration from: {}", path.display());
            Ok(Some(contents))
        },
        // A discovered file can vanish between the check and the read
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PdsError::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Execute the selected command.
pub async fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;
    let config = cli.load_config().await?;

    match cli.command {
        Command::CheckConfig => check_config(&config),
        Command::Server(_) => run_server(config).await,
        Command::Gateway(_) => run_gateway(config).await,
    }
}

fn check_config(config: &Config) -> Result<()> {
    config.validate()?;
    let yaml = serde_yaml::to_string(config)?;
    println!("Configuration is valid!");
    print!("{yaml}");
    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    let shutdown = Shutdown::new();
    let signals = shutdown.listen_for_signals();

    let store = Arc::new(PortStore::new());
    let service = PortService::new(Arc::clone(&store));
    let mut supervisor = Supervisor::new(shutdown.clone(), config.server.shutdown_timeout);

    let bound = match runtime::grpc::spawn_listeners(
        &mut supervisor,
        &service,
        &config.server.grpc_addrs,
    )
    .await
    {
        Ok(bound) => bound,
        Err(e) => {
            signals.abort();
            return Err(e);
        },
    };
    tracing::info!(listeners = bound.len(), "pds server running");

    let result = supervisor.wait().await;
    signals.abort();
    tracing::info!(ports = store.len(), "pds server stopped");
    result
}

async fn run_gateway(config: Config) -> Result<()> {
    let shutdown = Shutdown::new();
    let signals = shutdown.listen_for_signals();

    tracing::info!(
        http = ?config.gateway.http_addrs,
        backends = ?config.gateway.backend_addrs,
        "pds gateway starting"
    );
    let result = gateway::run(&config.gateway, shutdown).await;
    signals.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_listen_flags() {
        let cli = Cli::try_parse_from(["pds", "server", "--listen", ":6001", "--listen", ":6002"])
            .unwrap();
        match &cli.command {
            Command::Server(args) => assert_eq!(args.listen, vec![":6001", ":6002"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_gateway_overrides_apply() {
        let cli = Cli::try_parse_from([
            "pds",
            "--debug",
            "gateway",
            "--backend",
            "10.0.0.1:50051",
            "--data-file",
            "ports.json",
        ])
        .unwrap();

        let config = cli.apply_overrides(ConfigBuilder::new()).build().unwrap();
        assert!(config.debug);
        assert_eq!(config.gateway.backend_addrs, vec!["10.0.0.1:50051"]);
        assert_eq!(config.gateway.data_file.as_deref(), Some("ports.json"));
        // untouched values keep their defaults
        assert_eq!(config.gateway.http_addrs, vec![":8008"]);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["pds"]).is_err());
    }

    #[tokio::test]
    async fn test_explicit_missing_config_is_error() {
        let cli = Cli::try_parse_from(["pds", "--config", "/nonexistent/pds.yaml", "check-config"])
            .unwrap();
        let err = cli.load_config().await.unwrap_err();
        assert!(matches!(err, PdsError::Config(_)));
    }
}
