//! OS signal handling against a running server pair.

#![cfg(unix)]

mod common;

use std::process::Command;
use std::time::Duration;

use common::{spawn, test_config};
use gantry_server::{App, LifecycleEvent, LifecycleState, ShutdownCause};
use tokio::signal::unix::{signal, SignalKind};

fn send_sigterm_to_self() {
    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn test_sigterm_triggers_graceful_shutdown() {
    // Replaces the default disposition so SIGTERM cannot kill the test binary
    // before the server has registered its own handler.
    let _sigterm = signal(SignalKind::terminate()).unwrap();

    let config = test_config().handle_os_signals(true).build().unwrap();
    let running = spawn(App::new(config)).await;

    let shutdown = running.signal.clone();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !shutdown.is_shutdown() {
            send_sigterm_to_self();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("SIGTERM was not observed");

    tokio::time::timeout(Duration::from_secs(5), running.task)
        .await
        .expect("start did not return")
        .unwrap();

    assert_eq!(shutdown.cause(), Some(ShutdownCause::Terminate));
    let events = running.events;
    assert!(events.contains(|e| *e
        == LifecycleEvent::SignalReceived {
            cause: ShutdownCause::Terminate
        }));
    assert!(events.contains(|e| matches!(e, LifecycleEvent::HttpStopped { .. })));
    assert_eq!(events.transitions().last(), Some(&LifecycleState::Stopped));
}
