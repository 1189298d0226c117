//! Shared helpers for socket-level tests.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use gantry_core::HttpHandler;
use gantry_server::{
    App, FatalPolicy, LifecycleEvents, RecordingEvents, ServerConfig, ServerConfigBuilder,
    ShutdownSignal,
};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A config bound to loopback with ephemeral ports and in-process fatal
/// handling.
pub fn test_config() -> ServerConfigBuilder {
    ServerConfig::builder()
        .bind_host(Ipv4Addr::LOCALHOST)
        .rpc_port(0)
        .http_port(0)
        .handle_os_signals(false)
        .fatal_policy(FatalPolicy::Shutdown)
}

/// Returns a port that was free a moment ago.
pub fn free_port() -> u16 {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A server pair running on a background task.
pub struct Running {
    pub rpc: SocketAddr,
    pub http: SocketAddr,
    pub signal: ShutdownSignal,
    pub events: Arc<RecordingEvents>,
    pub task: JoinHandle<()>,
}

impl Running {
    /// Triggers shutdown and waits for `start` to return.
    pub async fn stop(self) -> Arc<RecordingEvents> {
        self.signal.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("start did not return")
            .unwrap();
        self.events
    }
}

/// Starts `app` and waits until both listeners are bound.
pub async fn spawn<G: HttpHandler + Clone>(app: App<G>) -> Running {
    let events = Arc::new(RecordingEvents::new());
    let sink: Arc<dyn LifecycleEvents> = events.clone();
    let app = app.with_events(sink);
    let readiness = app.readiness();
    let signal = app.shutdown_signal();

    let task = tokio::spawn(app.start());
    let rpc = readiness.rpc().await.unwrap();
    let http = readiness.http().await.unwrap();

    Running {
        rpc,
        http,
        signal,
        events,
        task,
    }
}

/// A response with its body collected.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Sends one HTTP/1.1 request to `addr`.
pub async fn send(addr: SocketAddr, method: Method, path: &str, body: &str) -> Reply {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let req = Request::builder()
        .method(method)
        .uri(path)
        .header(http::header::HOST, addr.to_string())
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap();
    let resp = sender.send_request(req).await.unwrap();
    let (parts, body) = resp.into_parts();

    Reply {
        status: parts.status,
        headers: parts.headers,
        body: body.collect().await.unwrap().to_bytes(),
    }
}

pub async fn get(addr: SocketAddr, path: &str) -> Reply {
    send(addr, Method::GET, path, "").await
}

/// Sends a bodiless gRPC call over HTTP/2 and returns the response headers.
pub async fn grpc_call(addr: SocketAddr, path: &str) -> HeaderMap {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) =
        hyper::client::conn::http2::handshake(TokioExecutor::new(), TokioIo::new(stream))
            .await
            .unwrap();
    tokio::spawn(conn);

    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("http://{addr}{path}"))
        .header(http::header::CONTENT_TYPE, "application/grpc")
        .header("te", "trailers")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = sender.send_request(req).await.unwrap();
    resp.headers().clone()
}
