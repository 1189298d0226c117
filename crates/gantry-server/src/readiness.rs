//! Per-listener readiness.
//!
//! Listeners are launched fire-and-forget, so `start` cannot tell the caller
//! when a socket is bound. [`Readiness`] fills that gap: each listener
//! publishes its status once, and callers await it.
//!
//! ```rust,ignore
//! let app = App::new(config);
//! let ready = app.readiness();
//! tokio::spawn(app.start());
//!
//! let http_addr = ready.http().await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::events::{LifecycleEvent, LifecycleEvents, ListenerKind};

/// Status published by one listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerStatus {
    /// Not bound yet.
    Pending,
    /// Bound and accepting connections.
    Listening(SocketAddr),
    /// Bind failed.
    Failed(String),
}

/// Errors returned while waiting for a listener.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    /// The listener could not bind its socket.
    #[error("{listener} listener failed to start: {reason}")]
    BindFailed {
        /// Which listener.
        listener: ListenerKind,
        /// The bind error.
        reason: String,
    },

    /// The listener went away without reporting a status.
    #[error("{listener} listener exited before reporting readiness")]
    Abandoned {
        /// Which listener.
        listener: ListenerKind,
    },
}

/// Handle for awaiting listener readiness.
///
/// Cloning is cheap; all clones observe the same listeners.
#[derive(Debug, Clone)]
pub struct Readiness {
    rpc: watch::Receiver<ListenerStatus>,
    http: watch::Receiver<ListenerStatus>,
}

impl Readiness {
    /// Waits until the RPC listener is bound and returns its address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding failed or the listener never started.
    pub async fn rpc(&self) -> Result<SocketAddr, ReadinessError> {
        wait(ListenerKind::Rpc, self.rpc.clone()).await
    }

    /// Waits until the HTTP listener is bound and returns its address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding failed or the listener never started.
    pub async fn http(&self) -> Result<SocketAddr, ReadinessError> {
        wait(ListenerKind::Http, self.http.clone()).await
    }

    /// Returns the current status of a listener without waiting.
    #[must_use]
    pub fn status(&self, listener: ListenerKind) -> ListenerStatus {
        match listener {
            ListenerKind::Rpc => self.rpc.borrow().clone(),
            ListenerKind::Http => self.http.borrow().clone(),
        }
    }
}

async fn wait(
    listener: ListenerKind,
    mut rx: watch::Receiver<ListenerStatus>,
) -> Result<SocketAddr, ReadinessError> {
    let status = rx
        .wait_for(|s| !matches!(s, ListenerStatus::Pending))
        .await
        .map_err(|_| ReadinessError::Abandoned { listener })?;

    match &*status {
        ListenerStatus::Listening(addr) => Ok(*addr),
        ListenerStatus::Failed(reason) => Err(ReadinessError::BindFailed {
            listener,
            reason: reason.clone(),
        }),
        ListenerStatus::Pending => Err(ReadinessError::Abandoned { listener }),
    }
}

/// Publishing side of one listener's readiness.
pub struct ReadyReporter {
    listener: ListenerKind,
    tx: watch::Sender<ListenerStatus>,
    events: Arc<dyn LifecycleEvents>,
}

impl ReadyReporter {
    /// Reports a successful bind.
    pub fn listening(&self, addr: SocketAddr) {
        self.events.event(&LifecycleEvent::Listening {
            listener: self.listener,
            addr,
        });
        self.tx.send_replace(ListenerStatus::Listening(addr));
    }

    /// Reports a bind failure.
    pub fn failed(&self, reason: impl Into<String>) {
        self.tx.send_replace(ListenerStatus::Failed(reason.into()));
    }

    /// Returns the listener this reporter belongs to.
    #[must_use]
    pub fn listener(&self) -> ListenerKind {
        self.listener
    }
}

impl std::fmt::Debug for ReadyReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyReporter")
            .field("listener", &self.listener)
            .field("status", &*self.tx.borrow())
            .finish_non_exhaustive()
    }
}

/// Unattached senders created with a [`Readiness`] handle.
#[derive(Debug)]
pub(crate) struct ReadinessSenders {
    rpc: watch::Sender<ListenerStatus>,
    http: watch::Sender<ListenerStatus>,
}

impl ReadinessSenders {
    /// Attaches the senders to an event sink.
    pub(crate) fn into_reporters(
        self,
        events: &Arc<dyn LifecycleEvents>,
    ) -> (ReadyReporter, ReadyReporter) {
        (
            ReadyReporter {
                listener: ListenerKind::Rpc,
                tx: self.rpc,
                events: Arc::clone(events),
            },
            ReadyReporter {
                listener: ListenerKind::Http,
                tx: self.http,
                events: Arc::clone(events),
            },
        )
    }
}

/// Creates a readiness handle and the senders that feed it.
pub(crate) fn channel() -> (Readiness, ReadinessSenders) {
    let (rpc_tx, rpc_rx) = watch::channel(ListenerStatus::Pending);
    let (http_tx, http_rx) = watch::channel(ListenerStatus::Pending);
    (
        Readiness {
            rpc: rpc_rx,
            http: http_rx,
        },
        ReadinessSenders {
            rpc: rpc_tx,
            http: http_tx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEvents;
    use std::time::Duration;

    fn reporters() -> (Readiness, ReadyReporter, ReadyReporter, Arc<RecordingEvents>) {
        let recorder = Arc::new(RecordingEvents::new());
        let events: Arc<dyn LifecycleEvents> = recorder.clone();
        let (readiness, senders) = channel();
        let (rpc, http) = senders.into_reporters(&events);
        (readiness, rpc, http, recorder)
    }

    #[tokio::test]
    async fn test_listening_resolves() {
        let (readiness, rpc, _http, recorder) = reporters();
        let addr: SocketAddr = "127.0.0.1:9001".parse().unwrap();

        let waiter = {
            let readiness = readiness.clone();
            tokio::spawn(async move { readiness.rpc().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        rpc.listening(addr);

        assert_eq!(waiter.await.unwrap(), Ok(addr));
        assert_eq!(readiness.status(ListenerKind::Rpc), ListenerStatus::Listening(addr));
        assert!(recorder.contains(|e| matches!(
            e,
            LifecycleEvent::Listening { listener: ListenerKind::Rpc, .. }
        )));
    }

    #[tokio::test]
    async fn test_failed_resolves_with_error() {
        let (readiness, _rpc, http, _recorder) = reporters();
        http.failed("address in use");

        let err = readiness.http().await.unwrap_err();
        assert_eq!(
            err,
            ReadinessError::BindFailed {
                listener: ListenerKind::Http,
                reason: "address in use".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_status_survives_reporter_drop() {
        let (readiness, rpc, _http, _recorder) = reporters();
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        rpc.listening(addr);
        drop(rpc);

        assert_eq!(readiness.rpc().await, Ok(addr));
    }

    #[tokio::test]
    async fn test_abandoned_listener() {
        let (readiness, rpc, _http, _recorder) = reporters();
        drop(rpc);

        assert_eq!(
            readiness.rpc().await,
            Err(ReadinessError::Abandoned {
                listener: ListenerKind::Rpc
            })
        );
    }

    #[test]
    fn test_initial_status_pending() {
        let (readiness, _senders) = channel();
        assert_eq!(readiness.status(ListenerKind::Http), ListenerStatus::Pending);
    }
}
