//! HTTP/JSON gateway in front of the RPC backends.
//!
//! Every route decodes its JSON body into the matching request message,
//! checks that the arguments mean something, calls the backend with a
//! deadline and encodes the reply as JSON. Failures are reported with an
//! [`AjaxCode`] that identifies the route and the step.
//!
//! The gateway does not accept traffic until the backend answers and the
//! optional data file has been loaded.

pub mod client;
pub mod error;

pub use client::BackendClient;
pub use error::{AjaxCode, AjaxError, AjaxErrorBody};

use crate::core::envfmt;
use crate::core::{GatewayConfig, PdsError, Result};
use crate::ingest::loader;
use crate::proto::{Circle, Content, Key, Name, Point, Port, Ports, Quest};
use crate::runtime::{bind, ListenerHandle, Readiness, Shutdown, ShutdownReason, Supervisor};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

const JSON_CONTENT: &str = "application/json;charset=utf-8";

/// Value of the `Server` header on every reply.
pub fn server_label() -> String {
    format!("pds-gateway/{}", env!("CARGO_PKG_VERSION"))
}

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    backend: BackendClient,
    call_timeout: Duration,
    shutdown: Shutdown,
    label: HeaderValue,
}

impl GatewayState {
    /// State for handlers calling `backend` with `call_timeout` per call.
    pub fn new(backend: BackendClient, call_timeout: Duration, shutdown: Shutdown) -> Self {
        Self {
            backend,
            call_timeout,
            shutdown,
            label: HeaderValue::from_str(&server_label())
                .unwrap_or_else(|_| HeaderValue::from_static("pds-gateway")),
        }
    }

    /// Runs one backend call under the configured deadline.
    async fn call<T, F>(&self, call: F) -> std::result::Result<T, tonic::Status>
    where
        F: Future<Output = std::result::Result<tonic::Response<T>, tonic::Status>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(reply) => reply.map(tonic::Response::into_inner),
            Err(_) => Err(tonic::Status::deadline_exceeded(format!(
                "no reply within {}ms",
                self.call_timeout.as_millis()
            ))),
        }
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.call_timeout);
        request
    }
}

/// Builds the gateway router.
pub fn router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/tool/ping", post(tool_ping))
        .route("/api/port/set", post(port_set))
        .route("/api/port/get", post(port_get))
        .route("/api/port/name", post(port_name))
        .route("/api/port/near", post(port_near))
        .route("/api/port/circle", post(port_circle))
        .route("/api/port/text", post(port_text))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), standard_headers))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}

/// Refuses work once shutdown has begun and stamps the `Server` header.
async fn standard_headers(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = if state.shutdown.is_triggered() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
    } else {
        next.run(request).await
    };
    response.headers_mut().insert(header::SERVER, state.label.clone());
    response
}

/// Decodes a request body. An empty body and bad JSON are distinct errors.
fn parse_arg<T: DeserializeOwned>(body: &Bytes) -> std::result::Result<T, AjaxError> {
    if body.is_empty() {
        return Err(AjaxError::bad_request("data not given", AjaxCode::NoReq));
    }
    serde_json::from_slice(body)
        .map_err(|e| AjaxError::bad_request(e.to_string(), AjaxCode::BadJson))
}

type ApiResult<T> = std::result::Result<Json<T>, AjaxError>;

async fn tool_ping(
    State(state): State<GatewayState>,
    body: Bytes,
) -> std::result::Result<Response, AjaxError> {
    let request = state.request(Content {
        value: body.to_vec(),
    });
    let reply = state
        .call(state.backend.tool().ping(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::ToolPingCallFail))?;

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT))],
        reply.value,
    )
        .into_response())
}

async fn port_set(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Key> {
    let arg: Port = parse_arg(&body)?;
    if arg.name.is_empty() || arg.unlocs.is_empty() {
        return Err(AjaxError::no_data(AjaxCode::PortSetNoData));
    }

    let request = state.request(arg);
    let reply = state
        .call(state.backend.port().set_by_key(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::PortSetCallFail))?;
    Ok(Json(reply))
}

async fn port_get(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Port> {
    let arg: Key = parse_arg(&body)?;
    if arg.value.is_empty() {
        return Err(AjaxError::no_data(AjaxCode::PortGetNoData));
    }

    let request = state.request(arg);
    let reply = state
        .call(state.backend.port().get_by_key(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::PortGetCallFail))?;
    Ok(Json(reply))
}

async fn port_name(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Port> {
    let arg: Name = parse_arg(&body)?;
    if arg.value.is_empty() {
        return Err(AjaxError::no_data(AjaxCode::PortNameNoData));
    }

    let request = state.request(arg);
    let reply = state
        .call(state.backend.port().get_by_name(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::PortNameCallFail))?;
    Ok(Json(reply))
}

async fn port_near(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Port> {
    let arg: Point = parse_arg(&body)?;
    if arg.is_origin() {
        return Err(AjaxError::no_data(AjaxCode::PortNearNoData));
    }

    let request = state.request(arg);
    let reply = state
        .call(state.backend.port().find_nearest(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::PortNearCallFail))?;
    Ok(Json(reply))
}

async fn port_circle(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Ports> {
    let arg: Circle = parse_arg(&body)?;
    let center = arg.center.unwrap_or_default();
    if center.is_origin() || arg.radius <= 0.0 {
        return Err(AjaxError::no_data(AjaxCode::PortCircNoData));
    }

    let request = state.request(arg);
    let reply = state
        .call(state.backend.port().find_in_circle(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::PortCircCallFail))?;
    Ok(Json(reply))
}

async fn port_text(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Ports> {
    let arg: Quest = parse_arg(&body)?;
    if arg.value.is_empty() {
        return Err(AjaxError::no_data(AjaxCode::PortTextNoData));
    }

    let request = state.request(arg);
    let reply = state
        .call(state.backend.port().find_text(request))
        .await
        .map_err(|s| AjaxError::call_failed(&s, AjaxCode::PortTextCallFail))?;
    Ok(Json(reply))
}

/// Runs the gateway until `shutdown` fires.
pub async fn run(config: &GatewayConfig, shutdown: Shutdown) -> Result<()> {
    Gateway::bind(config, shutdown).await?.serve().await
}

/// A gateway whose HTTP listeners are bound but not yet accepting.
///
/// Binding happens up front so a bad address fails fast. The listeners
/// only start accepting once [`Gateway::serve`] has reached the backend
/// and loaded the data file, if any. A failure in either step is fatal.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    backend: BackendClient,
    readiness: Readiness,
    supervisor: Supervisor,
    local_addrs: Vec<SocketAddr>,
}

impl Gateway {
    /// Binds every configured HTTP address.
    pub async fn bind(config: &GatewayConfig, shutdown: Shutdown) -> Result<Self> {
        let backend = BackendClient::new(&config.backend_addrs)?;
        let state = GatewayState::new(backend.clone(), config.call_timeout, shutdown.clone());
        let app = router(state, config.max_body_bytes);

        let readiness = Readiness::new();
        let mut supervisor = Supervisor::new(shutdown, config.shutdown_timeout);
        let local_addrs =
            spawn_http_listeners(&mut supervisor, &readiness, app, &config.http_addrs).await?;

        Ok(Self {
            config: config.clone(),
            backend,
            readiness,
            supervisor,
            local_addrs,
        })
    }

    /// Bound socket addresses, in configured order.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Handles on the HTTP listeners.
    pub fn handles(&self) -> &[ListenerHandle] {
        self.supervisor.handles()
    }

    /// Prepares the backend, opens the listeners and waits for shutdown.
    pub async fn serve(self) -> Result<()> {
        let shutdown = self.supervisor.shutdown().clone();
        let prepared = tokio::select! {
            prepared = prepare_backend(&self.backend, &self.config) => Some(prepared),
            () = shutdown.wait() => None,
        };

        match prepared {
            Some(Ok(())) => {
                tracing::info!("gateway ready");
                self.readiness.open();
            },
            Some(Err(e)) => {
                shutdown.trigger(ShutdownReason::Failure);
                let _ = self.supervisor.wait().await;
                return Err(e);
            },
            None => {},
        }

        self.supervisor.wait().await
    }
}

/// Binds every HTTP address and gates each listener on `readiness`.
/// Returns the bound socket addresses in the order given.
pub async fn spawn_http_listeners(
    supervisor: &mut Supervisor,
    readiness: &Readiness,
    app: Router,
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
        let app = app.clone();
        let signal = supervisor.shutdown().clone();

        tracing::info!(addr = %local, "HTTP server bound");
        supervisor.spawn_gated(ListenerHandle::new("http", addr), readiness.clone(), async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.wait().await })
                .await
                .map_err(PdsError::from)
        });
        locals.push(local);
    }
    Ok(locals)
}

async fn prepare_backend(backend: &BackendClient, config: &GatewayConfig) -> Result<()> {
    backend.wait_ready(config.connect_timeout).await?;

    if let Some(file) = &config.data_file {
        let path = PathBuf::from(envfmt::expand(file));
        loader::bulk_load(backend.port(), &path, config.ingest_timeout).await?;
    }
    Ok(())
}
