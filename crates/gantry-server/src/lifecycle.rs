//! The lifecycle orchestrator.
//!
//! Drives both listeners through `Idle → Starting → Running → ShuttingDown →
//! Stopped`.
//!
//! # Startup
//!
//! Each listener runs on its own task, supervised for fatal errors. A third
//! task waits for the [`ShutdownSignal`] and runs the shutdown sequence.
//! [`Orchestrator::run`] returns once that sequence has completed.
//!
//! # Shutdown
//!
//! 1. The signal is observed and reported.
//! 2. The deadline is fixed at `now + shutdown_timeout`.
//! 3. The RPC listener is stopped and awaited, bounded by the deadline unless
//!    the drain policy is [`RpcDrain::Unbounded`].
//! 4. The HTTP listener is stopped and awaited, bounded by the deadline but
//!    never by less than a short grace period. On expiry the failure is
//!    reported and its connections are dropped.
//! 5. Completion is signalled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gantry_core::BoxFuture;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{FatalPolicy, RpcDrain, ServerConfig};
use crate::error::ServerError;
use crate::events::{LifecycleEvent, LifecycleEvents, LifecycleState, ListenerKind};
use crate::shutdown::{ShutdownCause, ShutdownSignal};

const DEADLINE_EXCEEDED: &str = "shutdown deadline exceeded";

/// Minimum time the HTTP listener gets to close once asked to stop.
const HTTP_STOP_GRACE: Duration = Duration::from_millis(100);

/// One listener as seen by the orchestrator: a serve future and the token
/// that asks it to stop.
pub(crate) struct Listener {
    kind: ListenerKind,
    stop: CancellationToken,
    serve: BoxFuture<'static, Result<(), ServerError>>,
}

impl Listener {
    pub(crate) fn new<F>(kind: ListenerKind, stop: CancellationToken, serve: F) -> Self
    where
        F: Future<Output = Result<(), ServerError>> + Send + 'static,
    {
        Self {
            kind,
            stop,
            serve: Box::pin(serve),
        }
    }
}

/// Reports state transitions.
struct States {
    current: LifecycleState,
    events: Arc<dyn LifecycleEvents>,
}

impl States {
    fn advance(&mut self, to: LifecycleState) {
        self.events.event(&LifecycleEvent::Transition {
            from: self.current,
            to,
        });
        self.current = to;
    }
}

pub(crate) struct Orchestrator {
    signal: ShutdownSignal,
    events: Arc<dyn LifecycleEvents>,
    shutdown_timeout: Duration,
    rpc_drain: RpcDrain,
    fatal_policy: FatalPolicy,
    handle_os_signals: bool,
}

impl Orchestrator {
    pub(crate) fn new(
        config: &ServerConfig,
        signal: ShutdownSignal,
        events: Arc<dyn LifecycleEvents>,
    ) -> Self {
        Self {
            signal,
            events,
            shutdown_timeout: config.shutdown_timeout(),
            rpc_drain: config.rpc_drain(),
            fatal_policy: config.fatal_policy(),
            handle_os_signals: config.handle_os_signals(),
        }
    }

    /// Runs both listeners until the shutdown sequence completes.
    pub(crate) async fn run(self, rpc: Listener, http: Listener) {
        let mut states = States {
            current: LifecycleState::Idle,
            events: Arc::clone(&self.events),
        };

        states.advance(LifecycleState::Starting);
        let rpc_task = self.supervise(rpc.kind, rpc.serve);
        let http_task = self.supervise(http.kind, http.serve);
        if self.handle_os_signals {
            self.signal.listen_for_os_signals();
        }
        states.advance(LifecycleState::Running);

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            self.shutdown(states, (rpc_task, rpc.stop), (http_task, http.stop))
                .await;
            let _ = done_tx.send(());
        });

        if done_rx.await.is_err() {
            tracing::error!("shutdown sequence aborted before completion");
        }
    }

    /// Spawns a listener and applies the fatal policy to its outcome.
    fn supervise(
        &self,
        listener: ListenerKind,
        serve: BoxFuture<'static, Result<(), ServerError>>,
    ) -> JoinHandle<()> {
        let signal = self.signal.clone();
        let events = Arc::clone(&self.events);
        let policy = self.fatal_policy;

        tokio::spawn(async move {
            let result = serve.await;

            if signal.is_shutdown() {
                if let Err(e) = result {
                    events.event(&LifecycleEvent::ShutdownFailed {
                        listener,
                        reason: e.to_string(),
                    });
                }
                return;
            }

            let error = match result {
                Ok(()) => "listener stopped unexpectedly".to_string(),
                Err(e) => e.to_string(),
            };
            events.event(&LifecycleEvent::Fatal { listener, error });

            match policy {
                FatalPolicy::ExitProcess => std::process::exit(1),
                FatalPolicy::Shutdown => {
                    signal.trigger_with(ShutdownCause::Fatal);
                }
            }
        })
    }

    async fn shutdown(
        self,
        mut states: States,
        rpc: (JoinHandle<()>, CancellationToken),
        http: (JoinHandle<()>, CancellationToken),
    ) {
        let (mut rpc_task, rpc_stop) = rpc;
        let (mut http_task, http_stop) = http;

        self.signal.recv().await;
        let cause = self.signal.cause().unwrap_or(ShutdownCause::Programmatic);
        self.events.event(&LifecycleEvent::SignalReceived { cause });
        states.advance(LifecycleState::ShuttingDown);

        let started = Instant::now();
        let deadline = started + self.shutdown_timeout;
        self.events.event(&LifecycleEvent::ShutdownStarted {
            timeout: self.shutdown_timeout,
            rpc_drain: self.rpc_drain,
        });

        rpc_stop.cancel();
        let rpc_result = match self.rpc_drain {
            RpcDrain::Bounded => tokio::time::timeout_at(deadline, &mut rpc_task).await.ok(),
            RpcDrain::Unbounded => Some((&mut rpc_task).await),
        };
        match rpc_result {
            Some(Ok(())) => {}
            Some(Err(e)) => self.report_failure(ListenerKind::Rpc, e.to_string()),
            None => {
                rpc_task.abort();
                self.report_failure(ListenerKind::Rpc, DEADLINE_EXCEEDED.to_string());
            }
        }
        self.events.event(&LifecycleEvent::RpcStopped {
            elapsed: started.elapsed(),
        });

        self.events.event(&LifecycleEvent::HttpStopping);
        http_stop.cancel();
        let http_deadline = deadline.max(Instant::now() + HTTP_STOP_GRACE);
        match tokio::time::timeout_at(http_deadline, &mut http_task).await {
            Ok(Ok(())) => self.events.event(&LifecycleEvent::HttpStopped {
                elapsed: started.elapsed(),
            }),
            Ok(Err(e)) => self.report_failure(ListenerKind::Http, e.to_string()),
            Err(_) => {
                http_task.abort();
                self.report_failure(ListenerKind::Http, DEADLINE_EXCEEDED.to_string());
            }
        }

        states.advance(LifecycleState::Stopped);
    }

    fn report_failure(&self, listener: ListenerKind, reason: String) {
        self.events.event(&LifecycleEvent::ShutdownFailed { listener, reason });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEvents;

    fn orchestrator(
        timeout: Duration,
        drain: RpcDrain,
    ) -> (Orchestrator, ShutdownSignal, Arc<RecordingEvents>) {
        let config = ServerConfig::builder()
            .shutdown_timeout(timeout)
            .rpc_drain(drain)
            .fatal_policy(FatalPolicy::Shutdown)
            .handle_os_signals(false)
            .build()
            .unwrap();
        let signal = ShutdownSignal::new();
        let recorder = Arc::new(RecordingEvents::new());
        let events: Arc<dyn LifecycleEvents> = recorder.clone();
        (
            Orchestrator::new(&config, signal.clone(), events),
            signal,
            recorder,
        )
    }

    /// A listener that runs until stopped, then takes `drain` to finish.
    fn fake_listener(kind: ListenerKind, drain: Duration) -> Listener {
        let stop = CancellationToken::new();
        let token = stop.clone();
        Listener::new(kind, stop, async move {
            token.cancelled().await;
            tokio::time::sleep(drain).await;
            Ok(())
        })
    }

    fn failing_listener(kind: ListenerKind) -> Listener {
        Listener::new(kind, CancellationToken::new(), async move {
            Err(ServerError::Serve {
                listener: kind,
                reason: "boom".to_string(),
            })
        })
    }

    #[tokio::test]
    async fn test_clean_shutdown_sequence() {
        let (orch, signal, recorder) = orchestrator(Duration::from_secs(5), RpcDrain::Bounded);
        let run = tokio::spawn(orch.run(
            fake_listener(ListenerKind::Rpc, Duration::from_millis(20)),
            fake_listener(ListenerKind::Http, Duration::from_millis(5)),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.trigger();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("run should return")
            .unwrap();

        assert_eq!(
            recorder.transitions(),
            vec![
                LifecycleState::Starting,
                LifecycleState::Running,
                LifecycleState::ShuttingDown,
                LifecycleState::Stopped,
            ]
        );
        assert!(recorder.contains(|e| *e
            == LifecycleEvent::SignalReceived {
                cause: ShutdownCause::Programmatic
            }));
        assert!(!recorder.contains(|e| matches!(e, LifecycleEvent::ShutdownFailed { .. })));
        assert!(recorder.contains(|e| matches!(e, LifecycleEvent::HttpStopped { .. })));
    }

    #[tokio::test]
    async fn test_rpc_stops_before_http_starts_stopping() {
        let (orch, signal, recorder) = orchestrator(Duration::from_secs(5), RpcDrain::Bounded);
        signal.trigger();
        orch.run(
            fake_listener(ListenerKind::Rpc, Duration::from_millis(50)),
            fake_listener(ListenerKind::Http, Duration::ZERO),
        )
        .await;

        let rpc_stopped = recorder
            .position(|e| matches!(e, LifecycleEvent::RpcStopped { .. }))
            .unwrap();
        let http_stopping = recorder
            .position(|e| matches!(e, LifecycleEvent::HttpStopping))
            .unwrap();
        assert!(rpc_stopped < http_stopping);

        match &recorder.events()[rpc_stopped] {
            LifecycleEvent::RpcStopped { elapsed } => {
                assert!(*elapsed >= Duration::from_millis(50));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_deadline_exceeded_is_reported() {
        let (orch, signal, recorder) =
            orchestrator(Duration::from_millis(100), RpcDrain::Bounded);
        signal.trigger();

        let started = std::time::Instant::now();
        orch.run(
            fake_listener(ListenerKind::Rpc, Duration::ZERO),
            fake_listener(ListenerKind::Http, Duration::from_secs(30)),
        )
        .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(recorder.contains(|e| *e
            == LifecycleEvent::ShutdownFailed {
                listener: ListenerKind::Http,
                reason: DEADLINE_EXCEEDED.to_string(),
            }));
        assert_eq!(recorder.transitions().last(), Some(&LifecycleState::Stopped));
    }

    #[tokio::test]
    async fn test_bounded_rpc_drain_shares_deadline() {
        let (orch, signal, recorder) =
            orchestrator(Duration::from_millis(100), RpcDrain::Bounded);
        signal.trigger();

        let started = std::time::Instant::now();
        orch.run(
            fake_listener(ListenerKind::Rpc, Duration::from_secs(30)),
            fake_listener(ListenerKind::Http, Duration::ZERO),
        )
        .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(recorder.contains(|e| matches!(
            e,
            LifecycleEvent::ShutdownFailed {
                listener: ListenerKind::Rpc,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_idle_http_stops_after_rpc_uses_deadline() {
        let (orch, signal, recorder) =
            orchestrator(Duration::from_millis(50), RpcDrain::Bounded);
        signal.trigger();

        orch.run(
            fake_listener(ListenerKind::Rpc, Duration::from_secs(30)),
            fake_listener(ListenerKind::Http, Duration::ZERO),
        )
        .await;

        assert!(recorder.contains(|e| matches!(e, LifecycleEvent::HttpStopped { .. })));
        assert!(!recorder.contains(|e| matches!(
            e,
            LifecycleEvent::ShutdownFailed {
                listener: ListenerKind::Http,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_unbounded_rpc_drain_waits() {
        let (orch, signal, recorder) =
            orchestrator(Duration::from_millis(50), RpcDrain::Unbounded);
        signal.trigger();

        orch.run(
            fake_listener(ListenerKind::Rpc, Duration::from_millis(150)),
            fake_listener(ListenerKind::Http, Duration::ZERO),
        )
        .await;

        assert!(!recorder.contains(|e| matches!(
            e,
            LifecycleEvent::ShutdownFailed {
                listener: ListenerKind::Rpc,
                ..
            }
        )));
        assert!(recorder.contains(|e| *e
            == LifecycleEvent::ShutdownStarted {
                timeout: Duration::from_millis(50),
                rpc_drain: RpcDrain::Unbounded,
            }));
    }

    #[tokio::test]
    async fn test_fatal_listener_triggers_shutdown() {
        let (orch, signal, recorder) = orchestrator(Duration::from_secs(1), RpcDrain::Bounded);

        tokio::time::timeout(
            Duration::from_secs(2),
            orch.run(
                failing_listener(ListenerKind::Rpc),
                fake_listener(ListenerKind::Http, Duration::ZERO),
            ),
        )
        .await
        .expect("fatal error should lead to shutdown");

        assert_eq!(signal.cause(), Some(ShutdownCause::Fatal));
        assert!(recorder.contains(|e| matches!(
            e,
            LifecycleEvent::Fatal {
                listener: ListenerKind::Rpc,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_unexpected_exit_is_fatal() {
        let (orch, signal, recorder) = orchestrator(Duration::from_secs(1), RpcDrain::Bounded);
        let early_exit = Listener::new(ListenerKind::Http, CancellationToken::new(), async {
            Ok(())
        });

        orch.run(fake_listener(ListenerKind::Rpc, Duration::ZERO), early_exit)
            .await;

        assert_eq!(signal.cause(), Some(ShutdownCause::Fatal));
        assert!(recorder.contains(|e| matches!(
            e,
            LifecycleEvent::Fatal {
                listener: ListenerKind::Http,
                ..
            }
        )));
    }
}
