//! The HTTP listener.
//!
//! Serves an [`HttpRouter`] over HTTP/1.1 and HTTP/2 (negotiated per
//! connection). Request bodies are collected before dispatch.
//!
//! Stopping is cooperative: once the stop token is cancelled the listener
//! stops accepting, every open connection is asked to finish its in-flight
//! requests, and `serve` returns when the last one closes. Bounding that wait
//! is the caller's job; dropping the `serve` future drops every connection.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use gantry_core::{response, HttpResponse};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ServerError;
use crate::events::ListenerKind;
use crate::readiness::ReadyReporter;
use crate::router::HttpRouter;

/// The HTTP half of a server pair.
#[derive(Debug, Default)]
pub struct HttpServer {
    router: HttpRouter,
}

impl HttpServer {
    /// Creates a server for `router`.
    #[must_use]
    pub fn new(router: HttpRouter) -> Self {
        Self { router }
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &HttpRouter {
        &self.router
    }

    /// Returns the router for adding routes before the server starts.
    pub fn router_mut(&mut self) -> &mut HttpRouter {
        &mut self.router
    }

    /// Binds `addr` and serves until `stop` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound. The
    /// failure is also published through `ready`.
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
                    listener: ListenerKind::Http,
                    addr,
                    source,
                });
            }
        };
        let local_addr = listener.local_addr().unwrap_or(addr);
        ready.listening(local_addr);

        let router = Arc::new(self.router);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = stop.cancelled() => break,

                Some(_) = connections.join_next(), if !connections.is_empty() => {}

                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let router = Arc::clone(&router);
                        let stop = stop.clone();
                        connections.spawn(serve_connection(stream, remote_addr, router, stop));
                    }
                    Err(e) => {
                        tracing::warn!(listener = "http", error = %e, "failed to accept connection");
                    }
                },
            }
        }

        drop(listener);
        tracing::debug!(
            listener = "http",
            active = connections.len(),
            "waiting for http connections to close"
        );
        while connections.join_next().await.is_some() {}

        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Arc<HttpRouter>,
    stop: CancellationToken,
) {
    let service = service_fn(move |req: Request<Incoming>| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(handle_request(&router, req).await) }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = stop.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(remote_addr = %remote_addr, error = %e, "http connection closed with error");
    }
}

async fn handle_request(router: &HttpRouter, req: Request<Incoming>) -> HttpResponse {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return response::text(
                StatusCode::BAD_REQUEST,
                format!("failed to read request body: {e}\n"),
            );
        }
    };

    router.dispatch(Request::from_parts(parts, body)).await
}
