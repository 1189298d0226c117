//! Lifecycle events.
//!
//! The orchestrator reports everything it does through a [`LifecycleEvents`]
//! sink instead of logging directly. [`TracingEvents`] is the default sink
//! and turns events into `tracing` records. [`RecordingEvents`] keeps them in
//! memory so tests can assert on order and content.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::RpcDrain;
use crate::shutdown::ShutdownCause;

/// States of the server pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed, not started.
    Idle,
    /// Listener tasks are being launched.
    Starting,
    /// Both listener tasks are running.
    Running,
    /// The shutdown sequence is in progress.
    ShuttingDown,
    /// Shutdown finished; `start` is about to return.
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// The two listeners of a server pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// The gRPC listener.
    Rpc,
    /// The HTTP listener (gateway and documentation).
    Http,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc => f.write_str("rpc"),
            Self::Http => f.write_str("http"),
        }
    }
}

/// Something the orchestrator did or observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The state machine moved.
    Transition {
        /// Previous state.
        from: LifecycleState,
        /// New state.
        to: LifecycleState,
    },
    /// A listener bound its socket.
    Listening {
        /// Which listener.
        listener: ListenerKind,
        /// The bound address, with the OS-assigned port for port `0`.
        addr: SocketAddr,
    },
    /// The shutdown signal was observed.
    SignalReceived {
        /// Why shutdown was requested.
        cause: ShutdownCause,
    },
    /// The shutdown deadline was computed and draining begins.
    ShutdownStarted {
        /// Time allowed for the whole sequence.
        timeout: Duration,
        /// Whether the RPC drain is bounded by that deadline.
        rpc_drain: RpcDrain,
    },
    /// The RPC listener finished draining.
    RpcStopped {
        /// Time since the shutdown sequence started.
        elapsed: Duration,
    },
    /// The HTTP listener was asked to shut down.
    HttpStopping,
    /// The HTTP listener finished draining.
    HttpStopped {
        /// Time since the shutdown sequence started.
        elapsed: Duration,
    },
    /// A listener did not stop cleanly. Shutdown continues.
    ShutdownFailed {
        /// Which listener.
        listener: ListenerKind,
        /// What went wrong.
        reason: String,
    },
    /// A listener failed to bind or stopped unexpectedly.
    Fatal {
        /// Which listener.
        listener: ListenerKind,
        /// The error.
        error: String,
    },
}

/// A sink for lifecycle events.
///
/// Implementations must be cheap and must not block; they are called inline
/// from the listener and shutdown tasks.
pub trait LifecycleEvents: Send + Sync + 'static {
    /// Receives one event.
    fn event(&self, event: &LifecycleEvent);
}

/// Emits lifecycle events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl LifecycleEvents for TracingEvents {
    fn event(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Transition { from, to } => {
                tracing::debug!(from = %from, to = %to, "lifecycle transition");
            }
            LifecycleEvent::Listening { listener, addr } => {
                tracing::info!(listener = %listener, addr = %addr, "listening");
            }
            LifecycleEvent::SignalReceived { cause } => {
                tracing::info!(signal = %cause, "shutdown gracefully");
            }
            LifecycleEvent::ShutdownStarted { timeout, rpc_drain } => {
                tracing::info!(
                    deadline_ms = timeout.as_millis(),
                    rpc_drain = %rpc_drain,
                    "draining listeners"
                );
            }
            LifecycleEvent::RpcStopped { elapsed } => {
                tracing::info!(elapsed_ms = elapsed.as_millis(), "rpc server stopped");
            }
            LifecycleEvent::HttpStopping => {
                tracing::debug!("stopping http server");
            }
            LifecycleEvent::HttpStopped { elapsed } => {
                tracing::info!(elapsed_ms = elapsed.as_millis(), "http server stopped");
            }
            LifecycleEvent::ShutdownFailed { listener, reason } => {
                tracing::error!(listener = %listener, error = %reason, "failed to shutdown {listener} server");
            }
            LifecycleEvent::Fatal { listener, error } => {
                tracing::error!(listener = %listener, error = %error, "{listener} listener failed");
            }
        }
    }
}

/// Keeps every event in memory.
///
/// # Example
///
/// ```rust
/// use gantry_server::events::{LifecycleEvent, LifecycleEvents, RecordingEvents};
///
/// let recorder = RecordingEvents::new();
/// recorder.event(&LifecycleEvent::HttpStopping);
/// assert_eq!(recorder.events(), vec![LifecycleEvent::HttpStopping]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<LifecycleEvent>>,
    forward: bool,
}

impl RecordingEvents {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that also forwards every event to [`TracingEvents`].
    #[must_use]
    pub fn forwarding() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            forward: true,
        }
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Returns the index of the first event matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&LifecycleEvent) -> bool) -> Option<usize> {
        self.events.lock().iter().position(predicate)
    }

    /// Returns true if any recorded event matches `predicate`.
    pub fn contains(&self, predicate: impl Fn(&LifecycleEvent) -> bool) -> bool {
        self.position(predicate).is_some()
    }

    /// Returns the state transitions in order.
    #[must_use]
    pub fn transitions(&self) -> Vec<LifecycleState> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::Transition { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl LifecycleEvents for RecordingEvents {
    fn event(&self, event: &LifecycleEvent) {
        if self.forward {
            TracingEvents.event(event);
        }
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ListenerKind::Rpc.to_string(), "rpc");
        assert_eq!(ListenerKind::Http.to_string(), "http");
        assert_eq!(LifecycleState::ShuttingDown.to_string(), "shutting_down");
    }

    #[test]
    fn test_recording_order() {
        let recorder = RecordingEvents::forwarding();
        recorder.event(&LifecycleEvent::Transition {
            from: LifecycleState::Idle,
            to: LifecycleState::Starting,
        });
        recorder.event(&LifecycleEvent::RpcStopped {
            elapsed: Duration::from_millis(3),
        });
        recorder.event(&LifecycleEvent::HttpStopping);

        let rpc = recorder
            .position(|e| matches!(e, LifecycleEvent::RpcStopped { .. }))
            .unwrap();
        let http = recorder
            .position(|e| matches!(e, LifecycleEvent::HttpStopping))
            .unwrap();
        assert!(rpc < http);
        assert_eq!(recorder.transitions(), vec![LifecycleState::Starting]);
        assert!(!recorder.contains(|e| matches!(e, LifecycleEvent::Fatal { .. })));
    }
}
