//! Common test utilities and fixtures.

#![allow(dead_code)]

use pds_lib::proto::{Port, PortGuideClient, ToolGuideClient};
use pds_lib::runtime::{grpc, Shutdown, ShutdownReason, Supervisor};
use pds_lib::service::PortService;
use pds_lib::storage::PortStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

/// Test fixture builder for port records with sensible defaults.
pub struct TestPortBuilder {
    port: Port,
}

impl TestPortBuilder {
    pub fn new(unloc: &str, name: &str) -> Self {
        Self {
            port: Port {
                name: name.to_string(),
                city: name.to_string(),
                unlocs: vec![unloc.to_string()],
                ..Default::default()
            },
        }
    }

    /// Longitude first, as stored.
    pub fn at(mut self, lon: f32, lat: f32) -> Self {
        self.port.coordinates = vec![lon, lat];
        self
    }

    pub fn province(mut self, province: &str) -> Self {
        self.port.province = province.to_string();
        self
    }

    pub fn country(mut self, country: &str, code: &str) -> Self {
        self.port.country = country.to_string();
        self.port.code = code.to_string();
        self
    }

    pub fn build(self) -> Port {
        self.port
    }
}

pub fn dubai() -> Port {
    TestPortBuilder::new("AEDXB", "Dubai")
        .at(55.27, 25.25)
        .province("Dubai")
        .country("United Arab Emirates", "52005")
        .build()
}

pub fn port_rashid() -> Port {
    TestPortBuilder::new("AEPRA", "Port Rashid")
        .at(55.275_65, 25.284_755)
        .province("Dubai")
        .country("United Arab Emirates", "52005")
        .build()
}

pub fn sharjah() -> Port {
    TestPortBuilder::new("AESHJ", "Sharjah")
        .at(55.38, 25.35)
        .province("Sharjah")
        .country("United Arab Emirates", "52070")
        .build()
}

pub fn miami() -> Port {
    TestPortBuilder::new("USMIA", "Miami")
        .at(-80.19, 25.76)
        .province("Florida")
        .country("United States", "52002")
        .build()
}

/// The four-port fixture: three in the Gulf, one in Florida.
pub fn gulf_and_miami() -> Vec<Port> {
    vec![dubai(), port_rashid(), sharjah(), miami()]
}

/// Sorted record names, for order-insensitive comparison.
pub fn names(ports: &[Port]) -> Vec<String> {
    let mut names: Vec<_> = ports.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}

/// A backend running on an ephemeral local port.
pub struct TestBackend {
    pub addr: SocketAddr,
    pub store: Arc<PortStore>,
    pub shutdown: Shutdown,
    task: JoinHandle<pds_lib::Result<()>>,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self::start_on("127.0.0.1:0").await
    }

    pub async fn start_on(addr: &str) -> Self {
        let store = Arc::new(PortStore::new());
        let service = PortService::new(Arc::clone(&store));
        let shutdown = Shutdown::new();
        let mut supervisor = Supervisor::new(shutdown.clone(), Duration::from_secs(2));

        let bound = grpc::spawn_listeners(&mut supervisor, &service, &[addr.to_string()])
            .await
            .expect("bind test backend");
        let task = tokio::spawn(supervisor.wait());

        Self {
            addr: bound[0],
            store,
            shutdown,
            task,
        }
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn port_client(&self) -> PortGuideClient<Channel> {
        PortGuideClient::connect(self.uri()).await.expect("connect port client")
    }

    pub async fn tool_client(&self) -> ToolGuideClient<Channel> {
        ToolGuideClient::connect(self.uri()).await.expect("connect tool client")
    }

    pub async fn stop(self) {
        self.shutdown.trigger(ShutdownReason::Cancelled);
        self.task
            .await
            .expect("supervisor task")
            .expect("clean shutdown");
    }
}

/// A local address with nothing listening on it.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
