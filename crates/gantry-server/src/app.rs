//! The server pair.
//!
//! [`App`] owns one RPC server and one HTTP server. Construction composes the
//! HTTP router and binds nothing; [`App::start`] binds both ports and hands
//! control to the lifecycle orchestrator.
//!
//! # Example
//!
//! ```rust,no_run
//! use gantry_server::{App, ServerConfig};
//!
//! # async fn run() -> Result<(), gantry_server::ServerError> {
//! let config = ServerConfig::builder()
//!     .rpc_port(9001)
//!     .http_port(8081)
//!     .build()?;
//!
//! let app = App::new(config);
//! app.start().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use gantry_core::HttpHandler;
use gantry_gateway::GatewayMux;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::events::{LifecycleEvents, ListenerKind, TracingEvents};
use crate::http_server::HttpServer;
use crate::lifecycle::{Listener, Orchestrator};
use crate::readiness::{self, Readiness, ReadinessSenders};
use crate::router::{compose, HttpRouter};
use crate::rpc_server::RpcServer;
use crate::shutdown::ShutdownSignal;

/// A running instance: one RPC server, one HTTP server and the router that
/// ties the HTTP side together.
///
/// The gateway type defaults to [`GatewayMux`]. Any cloneable
/// [`HttpHandler`] can stand in for it via [`App::with_gateway`].
pub struct App<G = GatewayMux> {
    config: ServerConfig,
    rpc: RpcServer,
    http: HttpServer,
    gateway: G,
    signal: ShutdownSignal,
    events: Arc<dyn LifecycleEvents>,
    readiness: Readiness,
    senders: ReadinessSenders,
}

impl App {
    /// Creates a server pair with an empty [`GatewayMux`].
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_gateway(config, GatewayMux::new())
    }
}

impl<G> App<G>
where
    G: HttpHandler + Clone,
{
    /// Creates a server pair around a custom gateway handler.
    ///
    /// The gateway receives every request that does not match a
    /// documentation route or a route added through [`App::router_mut`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use gantry_core::{response, HttpRequest};
    /// use gantry_server::{App, ServerConfig};
    /// use http::StatusCode;
    ///
    /// let gateway = |_req: HttpRequest| async { response::status_text(StatusCode::IM_A_TEAPOT) };
    /// let app = App::with_gateway(ServerConfig::default(), gateway);
    /// assert!(app.router().has_route("/*"));
    /// ```
    #[must_use]
    pub fn with_gateway(config: ServerConfig, gateway: G) -> Self {
        let router = compose(
            config.descriptor().cloned(),
            config.docs().cloned(),
            Arc::new(gateway.clone()),
        );
        let (readiness, senders) = readiness::channel();

        Self {
            config,
            rpc: RpcServer::new(),
            http: HttpServer::new(router),
            gateway,
            signal: ShutdownSignal::new(),
            events: Arc::new(TracingEvents),
            readiness,
            senders,
        }
    }

    /// Replaces the lifecycle event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn LifecycleEvents>) -> Self {
        self.events = events;
        self
    }

    /// Uses an externally owned shutdown signal.
    ///
    /// Any [`Readiness`] or signal handles taken before this call keep
    /// pointing at the previous signal.
    #[must_use]
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.signal = signal;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the RPC server.
    pub fn rpc(&self) -> &RpcServer {
        &self.rpc
    }

    /// Returns the RPC server for service registration.
    pub fn rpc_mut(&mut self) -> &mut RpcServer {
        &mut self.rpc
    }

    /// Returns the HTTP server.
    pub fn http(&self) -> &HttpServer {
        &self.http
    }

    /// Returns the gateway handler.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the composed HTTP router.
    pub fn router(&self) -> &HttpRouter {
        self.http.router()
    }

    /// Returns the HTTP router for registering extra routes.
    pub fn router_mut(&mut self) -> &mut HttpRouter {
        self.http.router_mut()
    }

    /// Returns a handle that resolves once each listener is bound.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Returns a handle that triggers graceful shutdown.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Binds both listeners and runs until graceful shutdown completes.
    ///
    /// Returns once both servers have stopped or the shutdown deadline has
    /// passed. Under [`FatalPolicy::ExitProcess`](crate::FatalPolicy) a bind
    /// or serve failure terminates the process with status 1.
    pub async fn start(self) {
        let Self {
            config,
            rpc,
            http,
            signal,
            events,
            senders,
            ..
        } = self;

        let (rpc_ready, http_ready) = senders.into_reporters(&events);
        let rpc_stop = CancellationToken::new();
        let http_stop = CancellationToken::new();

        tracing::debug!(
            rpc_addr = %config.rpc_addr(),
            http_addr = %config.http_addr(),
            "starting server pair"
        );

        let rpc = Listener::new(
            ListenerKind::Rpc,
            rpc_stop.clone(),
            rpc.serve(config.rpc_addr(), rpc_stop, rpc_ready),
        );
        let http = Listener::new(
            ListenerKind::Http,
            http_stop.clone(),
            http.serve(config.http_addr(), http_stop, http_ready),
        );

        Orchestrator::new(&config, signal, events).run(rpc, http).await;
    }
}

impl<G> std::fmt::Debug for App<G>
where
    G: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("router", self.http.router())
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEvents;
    use crate::readiness::ListenerStatus;
    use std::time::Duration;

    #[test]
    fn test_construction_binds_nothing() {
        let config = ServerConfig::builder()
            .rpc_port(0)
            .http_port(0)
            .descriptor(r#"{"swagger":"2.0"}"#)
            .build()
            .unwrap();
        let app = App::new(config);

        assert_eq!(app.readiness().status(ListenerKind::Rpc), ListenerStatus::Pending);
        assert_eq!(app.readiness().status(ListenerKind::Http), ListenerStatus::Pending);
        assert!(app.router().has_route("/docs/api.swagger.json"));
        assert!(app.router().has_route("/*"));
    }

    #[test]
    fn test_router_without_descriptor() {
        let app = App::new(ServerConfig::default());
        assert!(!app.router().has_route("/docs/api.swagger.json"));
        assert!(!app.router().has_route("/docs/*"));
        assert_eq!(app.router().route_count(), 1);
    }

    #[test]
    fn test_router_mut_adds_route() {
        let mut app = App::new(ServerConfig::default());
        app.router_mut().route("/healthz", |_req| async {
            gantry_core::response::empty(http::StatusCode::NO_CONTENT)
        });
        assert!(app.router().has_route("/healthz"));
    }

    #[tokio::test]
    async fn test_start_and_programmatic_shutdown() {
        let config = ServerConfig::builder()
            .bind_host([127, 0, 0, 1])
            .rpc_port(0)
            .http_port(0)
            .handle_os_signals(false)
            .build()
            .unwrap();
        let recorder = Arc::new(RecordingEvents::new());
        let app = App::new(config).with_events(recorder.clone());
        let readiness = app.readiness();
        let signal = app.shutdown_signal();

        let running = tokio::spawn(app.start());
        let rpc_addr = readiness.rpc().await.unwrap();
        let http_addr = readiness.http().await.unwrap();
        assert_ne!(rpc_addr.port(), http_addr.port());

        signal.trigger();
        tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("start should return after shutdown")
            .unwrap();

        assert!(recorder.contains(|e| matches!(e, crate::LifecycleEvent::HttpStopped { .. })));
    }
}
