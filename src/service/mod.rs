//! gRPC facade over the store.
//!
//! [`PortService`] implements both `pds.ToolGuide` and `pds.PortGuide`. It
//! holds no state of its own beyond handles to the shared store: reads go
//! through the [`QueryEngine`], writes through the [`IngestPipeline`] or a
//! single store upsert.

use crate::ingest::IngestPipeline;
use crate::proto::{
    Circle, Content, Key, Name, Point, Port, PortGuide, PortGuideServer, Ports, Quest, Summary,
    ToolGuide, ToolGuideServer,
};
use crate::query::QueryEngine;
use crate::storage::PortStore;
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};

/// Request handler for both RPC services.
#[derive(Debug, Clone)]
pub struct PortService {
    engine: QueryEngine,
    ingest: IngestPipeline,
}

impl PortService {
    /// Create a service bound to `store`.
    pub fn new(store: Arc<PortStore>) -> Self {
        Self {
            engine: QueryEngine::new(Arc::clone(&store)),
            ingest: IngestPipeline::new(store),
        }
    }

    /// The store behind this service.
    pub fn store(&self) -> &Arc<PortStore> {
        self.engine.store()
    }

    /// Wrap the service for registration with a tonic router.
    pub fn into_servers(self) -> (ToolGuideServer<Self>, PortGuideServer<Self>) {
        let shared = Arc::new(self);
        (
            ToolGuideServer::from_arc(Arc::clone(&shared)),
            PortGuideServer::from_arc(shared),
        )
    }
}

#[tonic::async_trait]
impl ToolGuide for PortService {
    async fn ping(&self, request: Request<Content>) -> Result<Response<Content>, Status> {
        Ok(Response::new(request.into_inner()))
    }
}

#[tonic::async_trait]
impl PortGuide for PortService {
    async fn record_list(
        &self,
        request: Request<Streaming<Port>>,
    ) -> Result<Response<Summary>, Status> {
        let summary = self.ingest.run(request.into_inner()).await?;
        Ok(Response::new(summary))
    }

    async fn set_by_key(&self, request: Request<Port>) -> Result<Response<Key>, Status> {
        let value = self.store().insert(request.into_inner())?;
        tracing::debug!(key = %value, "port stored");
        Ok(Response::new(Key { value }))
    }

    async fn get_by_key(&self, request: Request<Key>) -> Result<Response<Port>, Status> {
        let key = request.into_inner();
        Ok(Response::new(self.engine.get_by_key(&key.value)))
    }

    async fn get_by_name(&self, request: Request<Name>) -> Result<Response<Port>, Status> {
        let name = request.into_inner();
        Ok(Response::new(self.engine.get_by_name(&name.value)))
    }

    async fn find_nearest(&self, request: Request<Point>) -> Result<Response<Port>, Status> {
        Ok(Response::new(self.engine.find_nearest(request.get_ref())))
    }

    async fn find_in_circle(&self, request: Request<Circle>) -> Result<Response<Ports>, Status> {
        let list = self.engine.find_in_circle(request.get_ref());
        Ok(Response::new(Ports { list }))
    }

    async fn find_text(&self, request: Request<Quest>) -> Result<Response<Ports>, Status> {
        let list = self.engine.find_text(request.get_ref());
        Ok(Response::new(Ports { list }))
    }
}
