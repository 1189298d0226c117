//! Graceful shutdown signal handling.
//!
//! [`ShutdownSignal`] is the one-shot "termination requested" event shared by
//! the listener tasks and the shutdown sequence. It is triggered by SIGINT,
//! SIGTERM, a fatal listener error, or programmatically, and it remembers the
//! first cause it was triggered with.
//!
//! # Example
//!
//! ```rust,ignore
//! use gantry_server::{ShutdownCause, ShutdownSignal};
//!
//! let shutdown = ShutdownSignal::new();
//! let waiter = shutdown.clone();
//!
//! tokio::spawn(async move {
//!     waiter.recv().await;
//!     println!("stopping because of {:?}", waiter.cause());
//! });
//!
//! shutdown.trigger();
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Why shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownCause {
    /// SIGINT or Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// [`ShutdownSignal::trigger`] was called.
    Programmatic,
    /// A listener failed and the fatal policy asked for a shutdown.
    Fatal,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("interrupt"),
            Self::Terminate => f.write_str("terminate"),
            Self::Programmatic => f.write_str("programmatic"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// The shared "termination requested" event.
///
/// `ShutdownSignal` can be cloned and shared, and all clones observe the
/// same trigger.
///
/// # Example
///
/// ```rust
/// use gantry_server::{ShutdownCause, ShutdownSignal};
///
/// let shutdown = ShutdownSignal::new();
/// let shutdown_clone = shutdown.clone();
///
/// shutdown.trigger_with(ShutdownCause::Terminate);
///
/// assert!(shutdown_clone.is_shutdown());
/// assert_eq!(shutdown_clone.cause(), Some(ShutdownCause::Terminate));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    cause: Arc<OnceLock<ShutdownCause>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gantry_server::ShutdownSignal;
    ///
    /// let shutdown = ShutdownSignal::new();
    /// assert!(!shutdown.is_shutdown());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the shutdown signal with [`ShutdownCause::Programmatic`].
    ///
    /// Later calls are no-ops.
    pub fn trigger(&self) {
        self.trigger_with(ShutdownCause::Programmatic);
    }

    /// Triggers the shutdown signal with an explicit cause.
    ///
    /// Only the first cause is recorded. Returns `true` if this call was the
    /// one that triggered the signal.
    pub fn trigger_with(&self, cause: ShutdownCause) -> bool {
        let first = self.cause.set(cause).is_ok();
        self.token.cancel();
        first
    }

    /// Returns `true` once any clone has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the recorded cause, if shutdown has been triggered.
    #[must_use]
    pub fn cause(&self) -> Option<ShutdownCause> {
        self.cause.get().copied()
    }

    /// Returns a future resolving on trigger.
    ///
    /// If shutdown has already been triggered, the future completes
    /// immediately.
    pub fn recv(&self) -> ShutdownReceiver {
        ShutdownReceiver {
            inner: Box::pin(self.token.clone().cancelled_owned()),
        }
    }

    /// Creates a shutdown signal that is also triggered by SIGINT and
    /// SIGTERM (Ctrl+C on non-Unix platforms).
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        signal.listen_for_os_signals();
        signal
    }

    /// Spawns a task that triggers this signal on SIGINT or SIGTERM.
    ///
    /// The task exits once the signal is triggered by any other means.
    pub fn listen_for_os_signals(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = signal.recv() => {}
                result = wait_for_os_signal() => match result {
                    Ok(cause) => {
                        signal.trigger_with(cause);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to register OS signal handlers");
                    }
                },
            }
        });
    }
}

/// Resolves once the signal is triggered. See [`ShutdownSignal::recv`].
pub struct ShutdownReceiver {
    inner: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl Future for ShutdownReceiver {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for ShutdownReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownReceiver").finish_non_exhaustive()
    }
}

/// Resolves on the first SIGINT or SIGTERM (Ctrl+C outside Unix) and
/// reports which one arrived.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub async fn wait_for_os_signal() -> std::io::Result<ShutdownCause> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => Ok(ShutdownCause::Terminate),
            _ = sigint.recv() => Ok(ShutdownCause::Interrupt),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownCause::Interrupt)
    }
}
