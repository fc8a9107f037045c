//! Supervisor coordinator
//!
//! Drives the detect, launch, watch and retry cycle for one source. Each
//! iteration is isolated: whatever fails inside it is logged and the loop
//! carries on after a backoff.

use super::config::SupervisorConfig;
use super::state::SupervisorState;
use crate::provider::LivenessProvider;
use crate::session::{SessionMode, SessionRunner, SessionSummary};
use crate::utils::{SupervisorError, SupervisorResult};
use futures_util::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Events emitted by the supervisor loop
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// The source went live and a session is starting
    Live,
    /// The source is not broadcasting
    Offline,
    /// A session finished
    SessionEnded(SessionSummary),
    /// An iteration failed (message of the caught error)
    Failed(String),
}

/// Tagged result of one loop iteration
#[derive(Debug)]
pub enum IterationOutcome {
    /// The source was not live
    Offline,
    /// A session ran to completion
    Completed(SessionSummary),
    /// Something failed; the loop keeps going
    Failed(SupervisorError),
}

/// Watches one source and runs a session whenever it is live
pub struct Supervisor {
    provider: Arc<dyn LivenessProvider>,

    runner: SessionRunner,

    config: SupervisorConfig,

    /// Current loop state
    state: Arc<RwLock<SupervisorState>>,

    /// Most recently completed session
    last_session: Arc<RwLock<Option<SessionSummary>>>,

    /// Event broadcaster
    event_tx: broadcast::Sender<SupervisorEvent>,
}

impl Supervisor {
    /// Create a supervisor, rejecting a configuration it cannot run with
    pub fn new(
        provider: Arc<dyn LivenessProvider>,
        config: SupervisorConfig,
    ) -> SupervisorResult<Self> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(100);
        Ok(Self {
            provider,
            runner: SessionRunner::new(&config),
            config,
            state: Arc::new(RwLock::new(SupervisorState::Idle)),
            last_session: Arc::new(RwLock::new(None)),
            event_tx,
        })
    }

    /// Get the current loop state
    pub fn state(&self) -> SupervisorState {
        *self.state.read()
    }

    /// Most recently completed session, if any
    pub fn last_session(&self) -> Option<SessionSummary> {
        self.last_session.read().clone()
    }

    /// Subscribe to supervisor events
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.event_tx.subscribe()
    }

    /// Run forever. Only returns if the surrounding task is dropped.
    pub async fn run(&self) {
        tracing::info!(
            "Watching {} ({}) in {:?} mode",
            self.provider.live_room_name(),
            self.provider.live_url(),
            self.config.mode
        );

        loop {
            let outcome = self.run_iteration().await;
            if let Some(delay) = self.next_delay(&outcome) {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Poll once and, if live, run one session to completion.
    ///
    /// Never returns an error: failures come back as `IterationOutcome::Failed`
    /// after being logged.
    pub async fn run_iteration(&self) -> IterationOutcome {
        let result = match AssertUnwindSafe(self.poll_and_capture()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                *self.state.write() = SupervisorState::Idle;
                Err(SupervisorError::Panicked(panic_message(panic.as_ref())))
            }
        };

        match result {
            Ok(Some(summary)) => {
                *self.last_session.write() = Some(summary.clone());
                let _ = self.event_tx.send(SupervisorEvent::SessionEnded(summary.clone()));
                IterationOutcome::Completed(summary)
            }
            Ok(None) => {
                tracing::debug!("{} is offline", self.provider.live_room_name());
                let _ = self.event_tx.send(SupervisorEvent::Offline);
                IterationOutcome::Offline
            }
            Err(e) => {
                tracing::error!(fatal = true, code = e.code(), "Iteration failed: {}", e);
                let _ = self.event_tx.send(SupervisorEvent::Failed(e.to_string()));
                IterationOutcome::Failed(e)
            }
        }
    }

    /// Delay before the next poll, `None` for an immediate retry
    pub fn next_delay(&self, outcome: &IterationOutcome) -> Option<Duration> {
        match outcome {
            IterationOutcome::Completed(summary) if summary.duration_ms < self.min_session_ms() => {
                tracing::info!(
                    "Session lasted only {}ms, polling again immediately",
                    summary.duration_ms
                );
                None
            }
            IterationOutcome::Completed(_) | IterationOutcome::Offline => {
                Some(self.config.idle_interval())
            }
            IterationOutcome::Failed(_) => Some(self.config.failure_backoff()),
        }
    }

    fn min_session_ms(&self) -> i64 {
        i64::try_from(self.config.min_session_ms).unwrap_or(i64::MAX)
    }

    async fn poll_and_capture(&self) -> SupervisorResult<Option<SessionSummary>> {
        if !self.provider.is_live().await? {
            return Ok(None);
        }

        tracing::info!("{} is live.", self.provider.live_room_name());
        *self.state.write() = SupervisorState::Live;
        let _ = self.event_tx.send(SupervisorEvent::Live);

        let result = self.capture().await;

        *self.state.write() = SupervisorState::Idle;
        result.map(Some)
    }

    async fn capture(&self) -> SupervisorResult<SessionSummary> {
        // The session clock starts inside the runner, so URL lookup time is not counted
        let stream_url = self.provider.resolve_stream_url().await?;
        self.runner
            .run(self.config.mode, self.provider.as_ref(), &stream_url)
            .await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
