//! Lifecycle: one coordinator, many producers.
//!
//! Tasks report through a [`LifecycleHandle`]. The first event cancels the
//! shared token; the coordinator keeps draining until every handle has been
//! dropped, so tasks get to finish their shutdown work before the process
//! exits. The first event also decides the outcome.

use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::ExporterError;

const EVENT_BUFFER: usize = 16;

#[derive(Debug)]
pub enum LifecycleEvent {
    Fatal(ExporterError),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

pub struct Lifecycle {
    events: mpsc::Receiver<LifecycleEvent>,
    sender: mpsc::Sender<LifecycleEvent>,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct LifecycleHandle {
    events: mpsc::Sender<LifecycleEvent>,
    cancel: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (sender, events) = mpsc::channel(EVENT_BUFFER);
        Self {
            events,
            sender,
            cancel: CancellationToken::new(),
        }
    }

    pub fn handle(&self) -> LifecycleHandle {
        LifecycleHandle {
            events: self.sender.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Wait for the first event, cancel everything, then drain.
    pub async fn wait(self) -> Outcome {
        let Lifecycle {
            mut events,
            sender,
            cancel,
        } = self;
        drop(sender);

        let mut outcome = None;
        while let Some(event) = events.recv().await {
            match event {
                LifecycleEvent::Fatal(e) => {
                    error!("Fatal: {}", e);
                    outcome.get_or_insert(Outcome::Failure);
                }
                LifecycleEvent::Shutdown => {
                    if outcome.is_none() {
                        info!("Shutdown requested, stopping tasks");
                    }
                    outcome.get_or_insert(Outcome::Success);
                }
            }
            cancel.cancel();
        }

        match outcome {
            Some(outcome) => outcome,
            None => {
                warn!("All tasks exited without reporting");
                Outcome::Success
            }
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleHandle {
    /// Token that fires once the coordinator has seen its first event.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn fatal(&self, error: ExporterError) {
        self.send(LifecycleEvent::Fatal(error)).await;
    }

    pub async fn shutdown(&self) {
        self.send(LifecycleEvent::Shutdown).await;
    }

    async fn send(&self, event: LifecycleEvent) {
        // Receiver only goes away after every handle is dropped.
        let _ = self.events.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn source_error() -> ExporterError {
        ExporterError::SourceRead {
            path: "/var/log/nginx/access.log".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_is_success() {
        let lifecycle = Lifecycle::new();
        let handle = lifecycle.handle();
        tokio::spawn(async move { handle.shutdown().await });
        assert_eq!(lifecycle.wait().await, Outcome::Success);
    }

    #[tokio::test]
    async fn test_fatal_is_failure_and_cancels_others() {
        let lifecycle = Lifecycle::new();
        let failing = lifecycle.handle();
        let waiting = lifecycle.handle();
        let stopped = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&stopped);
        tokio::spawn(async move {
            waiting.cancel_token().cancelled().await;
            counter.fetch_add(1, Ordering::SeqCst);
            drop(waiting);
        });
        tokio::spawn(async move { failing.fatal(source_error()).await });

        let outcome = tokio::time::timeout(Duration::from_secs(5), lifecycle.wait())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Failure);
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_event_decides_outcome() {
        let lifecycle = Lifecycle::new();
        let handle = lifecycle.handle();
        tokio::spawn(async move {
            handle.shutdown().await;
            handle.fatal(source_error()).await;
        });
        assert_eq!(lifecycle.wait().await, Outcome::Success);
    }

    #[tokio::test]
    async fn test_waits_for_slow_producers() {
        let lifecycle = Lifecycle::new();
        let trigger = lifecycle.handle();
        let slow = lifecycle.handle();
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&finished);
        tokio::spawn(async move {
            slow.cancel_token().cancelled().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            drop(slow);
        });
        tokio::spawn(async move { trigger.shutdown().await });

        lifecycle.wait().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_events_is_success() {
        let lifecycle = Lifecycle::new();
        drop(lifecycle.handle());
        assert_eq!(lifecycle.wait().await, Outcome::Success);
    }
}
