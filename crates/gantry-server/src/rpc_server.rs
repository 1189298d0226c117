//! The RPC listener.
//!
//! A thin wrapper around a `tonic` server. Services are registered through
//! [`RpcServer::routes_mut`] before start; binding happens in
//! [`RpcServer::serve`].
//!
//! ```rust,ignore
//! let mut app = App::new(config);
//! app.rpc_mut()
//!     .routes_mut()
//!     .add_service(GreeterServer::new(MyGreeter::default()));
//! ```

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;

use crate::error::ServerError;
use crate::events::ListenerKind;
use crate::readiness::ReadyReporter;

/// The RPC half of a server pair.
#[derive(Debug, Default)]
pub struct RpcServer {
    routes: RoutesBuilder,
}

impl RpcServer {
    /// Creates a server with no services.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a server from already registered services.
    #[must_use]
    pub fn with_routes(routes: RoutesBuilder) -> Self {
        Self { routes }
    }

    /// Returns the service registry.
    pub fn routes_mut(&mut self) -> &mut RoutesBuilder {
        &mut self.routes
    }

    /// Binds `addr` and serves until `stop` is cancelled.
    ///
    /// On cancellation the server stops accepting and waits for in-flight
    /// calls to finish before returning.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound, or
    /// `ServerError::Serve` if the transport fails while serving.
    pub async fn serve(
        self,
        addr: SocketAddr,
        stop: CancellationToken,
        ready: ReadyReporter,
    ) -> Result<(), ServerError> {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                ready.failed(source.to_string());
                return Err(ServerError::Bind {
                    listener: ListenerKind::Rpc,
                    addr,
                    source,
                });
            }
        };
        let local_addr = listener.local_addr().unwrap_or(addr);
        ready.listening(local_addr);

        let incoming = TcpListenerStream::new(listener);
        let mut server = Server::builder();
        server
            .add_routes(self.routes.routes())
            .serve_with_incoming_shutdown(incoming, stop.cancelled_owned())
            .await
            .map_err(|e| ServerError::Serve {
                listener: ListenerKind::Rpc,
                reason: e.to_string(),
            })
    }
}
