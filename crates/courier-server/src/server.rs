//! HTTP host.
//!
//! Accepts connections with Hyper on Tokio, answers the built-in probes,
//! resolves the route, collects the body and hands a [`DispatchRequest`] to
//! the [`Dispatcher`].
//!
//! Request flow:
//!
//! 1. `GET /health`, `GET /ready` and `GET /metrics` are answered directly.
//! 2. Route lookup: unknown paths get 404, known paths with an unrouted
//!    method get 405 with an `Allow` header.
//! 3. The body is collected under the dispatcher's size limit (413) and
//!    the request timeout (408).
//! 4. The dispatcher runs under the request timeout (504).
//!
//! # Example
//!
//! ```rust,no_run
//! use courier_core::fixtures;
//! use courier_dispatch::Dispatcher;
//! use courier_router::Router;
//! use courier_server::Server;
//! use http::Method;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.resource("/node", Method::POST, "node", "create", Some("hal_json"))?;
//!
//! let dispatcher = Dispatcher::builder().plugin(fixtures::node_resource())?.build();
//!
//! Server::builder()
//!     .http_addr("127.0.0.1:8080")
//!     .router(router)
//!     .dispatcher(dispatcher)
//!     .build()
//!     .run()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use courier_config::ServerConfig;
use courier_core::{DispatchError, DispatchRequest, RequestContext, RequestId, RouteTarget};
use courier_dispatch::Dispatcher;
use courier_router::{RouteLookup, Router};
use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::ServerError;
use crate::health::{HealthCheck, ReadinessCheck};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The Courier HTTP server.
#[derive(Debug)]
pub struct Server {
    http_addr: String,
    shutdown_timeout: Duration,
    request_timeout: Duration,
    max_connections: Option<usize>,
    router: Router,
    dispatcher: Arc<Dispatcher>,
    health: HealthCheck,
    readiness: ReadinessCheck,
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the configured bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns the readiness probe.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// Handles an already collected request without a socket.
    ///
    /// Runs the same steps as a request read from a connection.
    pub async fn respond(&self, request: Request<Bytes>) -> Response<Bytes> {
        self.handle(request.map(Full::new)).await
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr: SocketAddr =
            self.http_addr
                .parse()
                .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
                    addr: self.http_addr.clone(),
                    reason: e.to_string(),
                })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` fires, then
    /// drains open connections for up to the shutdown timeout.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Courier listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();
        let limit = server.max_connections.map(|n| Arc::new(Semaphore::new(n)));

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    let permit = match &limit {
                        Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                            Ok(permit) => Some(permit),
                            Err(_) => {
                                tracing::warn!(remote = %remote, "Connection limit reached, closing connection");
                                continue;
                            }
                        },
                        None => None,
                    };
                    let server = Arc::clone(&server);
                    let token = tracker.acquire();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.serve_connection(stream, shutdown).await {
                            tracing::debug!(remote = %remote, error = %e, "Connection closed with error");
                        }
                        drop(permit);
                        drop(token);
                    });
                }
                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        server.readiness.set_ready(false);
        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = server.shutdown_timeout.as_secs(),
            "Draining connections"
        );
        tokio::select! {
            () = tracker.wait_idle() => tracing::info!("All connections closed"),
            () = tokio::time::sleep(server.shutdown_timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "Shutdown timeout reached with connections still open"
            ),
        }
        tracing::info!("Courier stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await.map(Full::new)) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        let mut draining = false;
        loop {
            tokio::select! {
                result = connection.as_mut() => return result,
                () = shutdown.recv(), if !draining => {
                    draining = true;
                    connection.as_mut().graceful_shutdown();
                }
            }
        }
    }

    async fn handle<B>(&self, request: Request<B>) -> Response<Bytes>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        tracing::debug!(method = %parts.method, path = %parts.uri.path(), "Request received");

        if parts.method == Method::GET {
            match parts.uri.path() {
                "/health" => return json_response(StatusCode::OK, &self.health.status()),
                "/ready" => return self.ready_response(),
                "/metrics" => return metrics_response(),
                _ => {}
            }
        }

        let route = match self.router.lookup(&parts.method, parts.uri.path()) {
            RouteLookup::Found(route) => route,
            RouteLookup::MethodNotAllowed(methods) => {
                let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
                if let Ok(allow) = HeaderValue::from_str(&methods.allow_header()) {
                    response.headers_mut().insert(ALLOW, allow);
                }
                return response;
            }
            RouteLookup::NotFound => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    &format!("No route matches {}", parts.uri.path()),
                );
            }
        };
        let target = route.target.clone();

        let body = match self.collect_body(&parts.headers, body, &target).await {
            Ok(body) => body,
            Err(response) => return response,
        };

        let context = request_context(&parts.headers, &target);
        let request_id = context.request_id();
        let request = DispatchRequest::builder(target.clone())
            .method(parts.method)
            .parsed_uri(parts.uri)
            .headers(parts.headers)
            .body(body)
            .attributes(route.attributes)
            .context(context)
            .build();

        let mut response =
            match tokio::time::timeout(self.request_timeout, self.dispatcher.dispatch(request))
                .await
            {
                Ok(response) => response,
                Err(_) => {
                    tracing::warn!(
                        request_id = %request_id,
                        plugin = %target.plugin_id(),
                        operation = %target.operation(),
                        "Dispatch timed out"
                    );
                    let error =
                        DispatchError::rejection(StatusCode::GATEWAY_TIMEOUT, "Dispatch timed out");
                    self.dispatcher.translate(&error, &target)
                }
            };

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    async fn collect_body<B>(
        &self,
        headers: &HeaderMap,
        body: B,
        target: &RouteTarget,
    ) -> Result<Bytes, Response<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let limit = self.dispatcher.max_body_bytes();
        let declared = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if let Some(actual) = declared.filter(|len| *len > limit) {
            let error = DispatchError::PayloadTooLarge { limit, actual };
            return Err(self.dispatcher.translate(&error, target));
        }

        let error = match tokio::time::timeout(
            self.request_timeout,
            Limited::new(body, limit).collect(),
        )
        .await
        {
            Ok(Ok(collected)) => return Ok(collected.to_bytes()),
            Ok(Err(e)) if e.is::<LengthLimitError>() => DispatchError::PayloadTooLarge {
                limit,
                actual: limit.saturating_add(1),
            },
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Failed to read request body");
                DispatchError::bad_request(format!("Failed to read request body: {e}"))
            }
            Err(_) => {
                tracing::warn!(plugin = %target.plugin_id(), "Request body collection timed out");
                DispatchError::rejection(
                    StatusCode::REQUEST_TIMEOUT,
                    "Request body collection timed out",
                )
            }
        };
        Err(self.dispatcher.translate(&error, target))
    }

    fn ready_response(&self) -> Response<Bytes> {
        let status = self.readiness.status();
        let code = if status.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_response(code, &status)
    }
}

fn request_context(headers: &HeaderMap, target: &RouteTarget) -> RequestContext {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::parse)
        .map_or_else(RequestContext::new, RequestContext::with_request_id)
        .with_plugin_id(target.plugin_id())
        .with_operation(target.operation())
}

fn metrics_response() -> Response<Bytes> {
    match courier_telemetry::render_metrics() {
        Some(text) => {
            let mut response = Response::new(Bytes::from(text));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
            );
            response
        }
        None => error_response(StatusCode::NOT_FOUND, "Metrics are not enabled"),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Bytes> {
    json_response(status, &json!({ "error": message }))
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Bytes> {
    let bytes = serde_json::to_vec(body).map_or_else(|_| Bytes::from_static(b"{}"), Bytes::from);
    let mut response = Response::new(bytes);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Builder for [`Server`].
#[derive(Debug)]
pub struct ServerBuilder {
    http_addr: String,
    shutdown_timeout: Duration,
    request_timeout: Duration,
    max_connections: Option<usize>,
    service_name: String,
    service_version: String,
    router: Router,
    dispatcher: Option<Arc<Dispatcher>>,
    readiness: ReadinessCheck,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            http_addr: defaults.http_addr,
            shutdown_timeout: Duration::from_secs(defaults.shutdown_timeout_secs),
            request_timeout: Duration::from_millis(defaults.request_timeout_ms),
            max_connections: defaults.max_connections,
            service_name: "courier".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            router: Router::new(),
            dispatcher: None,
            readiness: ReadinessCheck::new(),
        }
    }
}

impl ServerBuilder {
    /// Applies a `[server]` configuration section.
    #[must_use]
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.http_addr = config.http_addr.clone();
        self.shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
        self.request_timeout = Duration::from_millis(config.request_timeout_ms);
        self.max_connections = config.max_connections;
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the timeout for body collection and for dispatch.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Caps concurrent connections. Extra connections are closed on accept.
    #[must_use]
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Sets the service name reported by `/health`.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Sets the version reported by `/health`.
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Sets the router.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Sets the dispatcher.
    #[must_use]
    pub fn dispatcher(self, dispatcher: Dispatcher) -> Self {
        self.shared_dispatcher(Arc::new(dispatcher))
    }

    /// Sets a dispatcher shared with other owners, such as a config reloader.
    #[must_use]
    pub fn shared_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Adds a readiness check reported by `/ready`.
    #[must_use]
    pub fn readiness_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.readiness = self.readiness.add_check(name, check);
        self
    }

    /// Builds the server. Without a dispatcher, one with no plugins is used.
    #[must_use]
    pub fn build(self) -> Server {
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Arc::new(Dispatcher::builder().build()));
        Server {
            http_addr: self.http_addr,
            shutdown_timeout: self.shutdown_timeout,
            request_timeout: self.request_timeout,
            max_connections: self.max_connections,
            router: self.router,
            dispatcher,
            health: HealthCheck::new(self.service_name, self.service_version),
            readiness: self.readiness,
        }
    }
}
