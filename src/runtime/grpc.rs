//! Backend RPC listeners.

use super::listener::{bind, ListenerHandle};
use super::supervisor::Supervisor;
use crate::core::envfmt;
use crate::core::{PdsError, Result};
use crate::service::PortService;
use std::net::SocketAddr;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

/// Binds every address in `addrs` and hands one RPC server per address to
/// `supervisor`. All binds happen before any listener starts serving, so a
/// bad address fails the whole call. Returns the bound socket addresses in
/// the order given.
pub async fn spawn_listeners(
    supervisor: &mut Supervisor,
    service: &PortService,
    addrs: &[String],
) -> Result<Vec<SocketAddr>> {
    let mut bound = Vec::with_capacity(addrs.len());
    for addr in addrs {
        let addr = envfmt::listen_addr(addr);
        let listener = bind(&addr).await?;
        let local = listener.local_addr()?;
        bound.push((addr, local, listener));
    }

    let mut locals = Vec::with_capacity(bound.len());
    for (addr, local, listener) in bound {
        let handle = ListenerHandle::new("grpc", addr);
        let (tool, port) = service.clone().into_servers();
        let signal = supervisor.shutdown().clone();

        tracing::info!(addr = %local, "gRPC server bound");
        supervisor.spawn(handle, async move {
            Server::builder()
                .add_service(tool)
                .add_service(port)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    signal.wait().await;
                })
                .await
                .map_err(PdsError::from)
        });
        locals.push(local);
    }
    Ok(locals)
}
