//! Server configuration types.
//!
//! [`ServerConfig`] is immutable once built. [`ServerConfigBuilder::build`]
//! validates it eagerly, so an invalid port pair is reported before anything
//! is bound.
//!
//! # Example
//!
//! ```rust
//! use gantry_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_port(8081)
//!     .rpc_port(9001)
//!     .shutdown_timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.http_port(), 8081);
//! assert_eq!(config.rpc_port(), 9001);
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use gantry_docs::DocsAssets;

use crate::error::ServerError;

/// Default RPC listener port.
pub const DEFAULT_RPC_PORT: u16 = 9000;

/// Default HTTP listener port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default bind host.
pub const DEFAULT_BIND_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// How long the RPC listener may take to drain during shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RpcDrain {
    /// The RPC drain shares the shutdown deadline with the HTTP drain.
    /// Calls still running when the deadline passes are dropped.
    ///
    /// If the RPC drain uses up the deadline, the HTTP listener is still given
    /// a short grace period to close, so an idle HTTP listener stops cleanly.
    #[default]
    Bounded,
    /// The RPC drain waits for every in-flight call, however long it takes.
    /// Only the HTTP drain is bounded.
    Unbounded,
}

impl fmt::Display for RpcDrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded => f.write_str("bounded"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// What happens when a listener fails to bind or stops unexpectedly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FatalPolicy {
    /// Log the failure and exit the process with status 1.
    #[default]
    ExitProcess,
    /// Log the failure and run the normal shutdown sequence, so `start`
    /// returns.
    Shutdown,
}

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// RPC listener port. `0` asks the OS for an ephemeral port.
    rpc_port: u16,

    /// HTTP listener port. `0` asks the OS for an ephemeral port.
    http_port: u16,

    /// Host both listeners bind to.
    bind_host: IpAddr,

    /// API descriptor served at `/docs/api.swagger.json`.
    descriptor: Option<Bytes>,

    /// Documentation assets served under `/docs/`.
    docs: Option<Arc<dyn DocsAssets>>,

    /// Deadline for graceful shutdown, measured from the signal.
    shutdown_timeout: Duration,

    /// Whether the RPC drain is bounded by the deadline.
    rpc_drain: RpcDrain,

    /// Reaction to fatal listener errors.
    fatal_policy: FatalPolicy,

    /// Whether SIGINT/SIGTERM trigger shutdown.
    handle_os_signals: bool,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the RPC listener port.
    #[must_use]
    pub fn rpc_port(&self) -> u16 {
        self.rpc_port
    }

    /// Returns the HTTP listener port.
    #[must_use]
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Returns the bind host.
    #[must_use]
    pub fn bind_host(&self) -> IpAddr {
        self.bind_host
    }

    /// Returns the RPC listener address.
    #[must_use]
    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.rpc_port)
    }

    /// Returns the HTTP listener address.
    #[must_use]
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.http_port)
    }

    /// Returns the API descriptor bytes, if configured.
    #[must_use]
    pub fn descriptor(&self) -> Option<&Bytes> {
        self.descriptor.as_ref()
    }

    /// Returns the documentation asset provider, if configured.
    #[must_use]
    pub fn docs(&self) -> Option<&Arc<dyn DocsAssets>> {
        self.docs.as_ref()
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the RPC drain policy.
    #[must_use]
    pub fn rpc_drain(&self) -> RpcDrain {
        self.rpc_drain
    }

    /// Returns the fatal error policy.
    #[must_use]
    pub fn fatal_policy(&self) -> FatalPolicy {
        self.fatal_policy
    }

    /// Returns whether OS signals trigger shutdown.
    #[must_use]
    pub fn handle_os_signals(&self) -> bool {
        self.handle_os_signals
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rpc_port: DEFAULT_RPC_PORT,
            http_port: DEFAULT_HTTP_PORT,
            bind_host: DEFAULT_BIND_HOST,
            descriptor: None,
            docs: None,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            rpc_drain: RpcDrain::default(),
            fatal_policy: FatalPolicy::default(),
            handle_os_signals: true,
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the RPC listener port.
    #[must_use]
    pub fn rpc_port(mut self, port: u16) -> Self {
        self.config.rpc_port = port;
        self
    }

    /// Sets the HTTP listener port.
    #[must_use]
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.http_port = port;
        self
    }

    /// Sets the host both listeners bind to.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gantry_server::ServerConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ServerConfig::builder()
    ///     .bind_host(Ipv4Addr::LOCALHOST)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.http_addr().to_string(), "127.0.0.1:8080");
    /// ```
    #[must_use]
    pub fn bind_host(mut self, host: impl Into<IpAddr>) -> Self {
        self.config.bind_host = host.into();
        self
    }

    /// Sets the API descriptor served at `/docs/api.swagger.json`.
    ///
    /// Without a descriptor no `/docs/` routes are mounted at all.
    #[must_use]
    pub fn descriptor(mut self, descriptor: impl Into<Bytes>) -> Self {
        self.config.descriptor = Some(descriptor.into());
        self
    }

    /// Sets the documentation asset provider.
    ///
    /// Defaults to a Swagger UI page when a descriptor is configured.
    #[must_use]
    pub fn docs(mut self, docs: impl DocsAssets) -> Self {
        self.config.docs = Some(Arc::new(docs));
        self
    }

    /// Sets an already shared documentation asset provider.
    #[must_use]
    pub fn docs_shared(mut self, docs: Arc<dyn DocsAssets>) -> Self {
        self.config.docs = Some(docs);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Sets the RPC drain policy.
    #[must_use]
    pub fn rpc_drain(mut self, drain: RpcDrain) -> Self {
        self.config.rpc_drain = drain;
        self
    }

    /// Sets the fatal error policy.
    #[must_use]
    pub fn fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.config.fatal_policy = policy;
        self
    }

    /// Enables or disables SIGINT/SIGTERM handling.
    ///
    /// When disabled, only [`ShutdownSignal::trigger`](crate::ShutdownSignal::trigger)
    /// starts the shutdown sequence.
    #[must_use]
    pub fn handle_os_signals(mut self, enabled: bool) -> Self {
        self.config.handle_os_signals = enabled;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::InvalidConfig` if both listeners are given the
    /// same non-zero port or the shutdown timeout is zero.
    pub fn build(self) -> Result<ServerConfig, ServerError> {
        let config = self.config;

        if config.rpc_port != 0 && config.rpc_port == config.http_port {
            return Err(ServerError::InvalidConfig(format!(
                "rpc_port and http_port must differ, both are {}",
                config.rpc_port
            )));
        }

        if config.shutdown_timeout.is_zero() {
            return Err(ServerError::InvalidConfig(
                "shutdown_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_docs::EmbeddedDocs;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.rpc_port(), 9000);
        assert_eq!(config.http_port(), 8080);
        assert_eq!(config.bind_host(), DEFAULT_BIND_HOST);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
        assert_eq!(config.rpc_drain(), RpcDrain::Bounded);
        assert_eq!(config.fatal_policy(), FatalPolicy::ExitProcess);
        assert!(config.handle_os_signals());
        assert!(config.descriptor().is_none());
        assert!(config.docs().is_none());
    }

    #[test]
    fn test_builder_custom_ports() {
        let config = ServerConfig::builder()
            .http_port(8081)
            .rpc_port(9001)
            .build()
            .unwrap();

        assert_eq!(config.http_addr().port(), 8081);
        assert_eq!(config.rpc_addr().port(), 9001);
    }

    #[test]
    fn test_builder_rejects_equal_ports() {
        let err = ServerConfig::builder()
            .http_port(9000)
            .rpc_port(9000)
            .build()
            .unwrap_err();

        assert!(matches!(err, ServerError::InvalidConfig(_)));
        assert!(err.to_string().contains("9000"));
    }

    #[test]
    fn test_builder_allows_two_ephemeral_ports() {
        let config = ServerConfig::builder()
            .http_port(0)
            .rpc_port(0)
            .build()
            .unwrap();
        assert_eq!(config.http_port(), 0);
        assert_eq!(config.rpc_port(), 0);
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ServerConfig::builder()
            .shutdown_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_all_options() {
        let config = ServerConfig::builder()
            .bind_host(Ipv4Addr::LOCALHOST)
            .descriptor(r#"{"swagger":"2.0"}"#)
            .docs(EmbeddedDocs::swagger_ui())
            .shutdown_timeout(Duration::from_millis(500))
            .rpc_drain(RpcDrain::Unbounded)
            .fatal_policy(FatalPolicy::Shutdown)
            .handle_os_signals(false)
            .build()
            .unwrap();

        assert_eq!(config.rpc_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.descriptor().unwrap(), &Bytes::from_static(br#"{"swagger":"2.0"}"#));
        assert!(config.docs().is_some());
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(500));
        assert_eq!(config.rpc_drain(), RpcDrain::Unbounded);
        assert_eq!(config.fatal_policy(), FatalPolicy::Shutdown);
        assert!(!config.handle_os_signals());
    }

    #[test]
    fn test_rpc_drain_display() {
        assert_eq!(RpcDrain::Bounded.to_string(), "bounded");
        assert_eq!(RpcDrain::Unbounded.to_string(), "unbounded");
    }
}
