//! Session runner
//!
//! Launches the external media tool for one session and blocks until it exits.
//! Playback sessions run the player unattended; record sessions run the
//! segmenting recorder under a stall watchdog and write a metadata sidecar.

use super::metadata::SessionMetadata;
use super::output::OutputPump;
use super::paths::{derive_dir_name, RecordingPaths};
use super::state::{ExitReason, Session, SessionMode, SessionSummary};
use crate::provider::LivenessProvider;
use crate::supervisor::config::SupervisorConfig;
use crate::utils::{SupervisorError, SupervisorResult};
use crate::watchdog::{ActivityClock, StallWatchdog, WatchdogOutcome};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};

/// How long output readers may keep draining after the child exits
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs playback or record sessions with a fixed tool configuration
#[derive(Debug, Clone)]
pub struct SessionRunner {
    player: String,
    recorder: String,
    record_root: PathBuf,
    extension: String,
    segment_time: String,
    watchdog: StallWatchdog,
}

impl SessionRunner {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            player: config.player.clone(),
            recorder: config.recorder.clone(),
            record_root: config.record_root.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
            segment_time: config.segment_time.clone(),
            watchdog: StallWatchdog::new(config.watchdog_interval(), config.stall_timeout()),
        }
    }

    /// Run one session in `mode` against an already-resolved stream URL
    pub async fn run(
        &self,
        mode: SessionMode,
        provider: &dyn LivenessProvider,
        stream_url: &str,
    ) -> SupervisorResult<SessionSummary> {
        match mode {
            SessionMode::Playback => self.play(stream_url).await,
            SessionMode::Record => self.record(provider, stream_url).await,
        }
    }

    /// Open the stream in the player and wait for the player to exit.
    ///
    /// No watchdog: a silent player runs until it exits or is killed externally.
    pub async fn play(&self, stream_url: &str) -> SupervisorResult<SessionSummary> {
        let mut session = Session::begin(SessionMode::Playback, stream_url);

        let args = vec![stream_url.to_string()];
        tracing::debug!("Process args: {:?}", args);

        let mut child = spawn_tool(&self.player, &args)?;
        let pump = OutputPump::attach(&mut child, session.id, None);

        let status = child.wait().await;
        pump.finish(OUTPUT_DRAIN_GRACE).await;
        let status = status?;

        session.finish();
        tracing::info!(
            session = %session.id,
            "Player exited with {} after {}ms",
            status,
            session.duration_ms().unwrap_or(0)
        );

        Ok(session.summary(ExitReason::Exited { code: status.code() }, None))
    }

    /// Record the stream into segments, then write the metadata sidecar
    pub async fn record(
        &self,
        provider: &dyn LivenessProvider,
        stream_url: &str,
    ) -> SupervisorResult<SessionSummary> {
        let mut session = Session::begin(SessionMode::Record, stream_url);

        let dir_name = derive_dir_name(provider.live_room_name(), provider.live_url());
        let paths = RecordingPaths::new(&self.record_root, &dir_name, session.start_ms, &self.extension);
        paths.prepare()?;
        session.destination = Some(paths.base.clone());

        let args = self.recorder_args(stream_url, &paths);
        tracing::info!(session = %session.id, "File save path: {}", paths.display_target().display());
        tracing::debug!("Process args: {:?}", args);

        let mut child = spawn_tool(&self.recorder, &args)?;

        let clock = Arc::new(ActivityClock::starting_now());
        let pump = OutputPump::attach(&mut child, session.id, Some(clock.clone()));

        let (exit_tx, exit_rx) = watch::channel(false);
        let (kill_tx, kill_rx) = oneshot::channel();
        let watchdog = tokio::spawn(self.watchdog.watch(clock, exit_rx, kill_tx));

        let status = wait_or_kill(&mut child, kill_rx).await;
        let _ = exit_tx.send(true);
        let outcome = match watchdog.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(session = %session.id, "Stall watchdog task failed: {}", e);
                WatchdogOutcome::ChildExited
            }
        };
        pump.finish(OUTPUT_DRAIN_GRACE).await;
        let status = status?;

        session.finish();
        let exit = match outcome {
            WatchdogOutcome::Stalled { .. } => ExitReason::Stalled,
            WatchdogOutcome::ChildExited => ExitReason::Exited { code: status.code() },
        };
        tracing::info!(
            session = %session.id,
            "Recorder stopped ({:?}) after {}ms",
            exit,
            session.duration_ms().unwrap_or(0)
        );

        let metadata = SessionMetadata::for_session(
            provider.live_room_name(),
            provider.live_url(),
            &session,
            &self.extension,
        );
        let sidecar = paths.sidecar();
        metadata.write(&sidecar)?;

        Ok(session.summary(exit, Some(sidecar)))
    }

    /// Arguments for the segmenting recorder: stream copy, fixed-length
    /// segments, a segment list and a numbered output pattern
    pub fn recorder_args(&self, stream_url: &str, paths: &RecordingPaths) -> Vec<String> {
        vec![
            "-i".to_string(),
            stream_url.to_string(),
            "-acodec".to_string(),
            "copy".to_string(),
            "-vcodec".to_string(),
            "copy".to_string(),
            "-f".to_string(),
            "segment".to_string(),
            "-segment_time".to_string(),
            self.segment_time.clone(),
            "-segment_list".to_string(),
            paths.segment_list().to_string_lossy().into_owned(),
            paths.segment_pattern().to_string_lossy().into_owned(),
        ]
    }
}

/// Spawn a media tool with piped output
fn spawn_tool(program: &str, args: &[String]) -> SupervisorResult<Child> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SupervisorError::Launch {
            program: program.to_string(),
            source,
        })
}

/// Wait for `child` to exit, killing it first if the watchdog asks
async fn wait_or_kill(
    child: &mut Child,
    mut kill_rx: oneshot::Receiver<()>,
) -> std::io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,
        Ok(()) = &mut kill_rx => {
            if let Err(e) = child.start_kill() {
                tracing::warn!("Failed to kill stalled recorder: {}", e);
            }
            child.wait().await
        }
    }
}
