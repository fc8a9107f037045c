//! Child process output forwarding
//!
//! Media tools are chatty on stderr and terminate progress lines with `\r`
//! rather than `\n`, so both count as line breaks here. Every line is logged
//! at info level and, when a clock is attached, marks the session as active.

use crate::watchdog::ActivityClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Longest line kept before it is flushed without a terminator
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Splits a byte stream into text lines on `\n` or `\r`
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completes. Empty lines are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if let Some(line) = self.take() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
                if self.pending.len() >= MAX_LINE_BYTES {
                    if let Some(line) = self.take() {
                        lines.push(line);
                    }
                }
            }
        }
        lines
    }

    /// Flush whatever is left once the stream ends
    pub fn finish(&mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

/// Reader tasks attached to a child's stdout and stderr
pub struct OutputPump {
    handles: Vec<JoinHandle<()>>,
}

impl OutputPump {
    /// Take the child's piped stdout/stderr and start forwarding them
    pub fn attach(child: &mut Child, session_id: Uuid, clock: Option<Arc<ActivityClock>>) -> Self {
        let mut handles = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            handles.push(tokio::spawn(forward(stdout, "stdout", session_id, clock.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            handles.push(tokio::spawn(forward(stderr, "stderr", session_id, clock)));
        }

        Self { handles }
    }

    /// Wait for the readers to drain, aborting any still running after `grace`.
    ///
    /// A grandchild can inherit the pipes and keep them open past the child's
    /// exit, so the readers are not awaited unconditionally.
    pub async fn finish(self, grace: Duration) {
        for mut handle in self.handles {
            if tokio::time::timeout(grace, &mut handle).await.is_err() {
                tracing::debug!("Output reader still busy after {:?}, aborting", grace);
                handle.abort();
            }
        }
    }
}

async fn forward<R>(reader: R, stream: &'static str, session_id: Uuid, clock: Option<Arc<ActivityClock>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut lines = LineBuffer::new();

    let emit = |line: String| {
        if let Some(clock) = &clock {
            clock.touch();
        }
        tracing::info!(session = %session_id, stream, "{}", line);
    };

    loop {
        let chunk = match reader.fill_buf().await {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(session = %session_id, "Failed to read {}: {}", stream, e);
                break;
            }
        };
        if chunk.is_empty() {
            break;
        }

        let len = chunk.len();
        for line in lines.push(chunk) {
            emit(line);
        }
        reader.consume(len);
    }

    if let Some(line) = lines.finish() {
        emit(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_newline_and_carriage_return() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"first\nframe=1\rframe=2\r\nlast");
        assert_eq!(lines, vec!["first", "frame=1", "frame=2"]);
        assert_eq!(buffer.finish(), Some("last".to_string()));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_lines_span_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"Input #0, fl").is_empty());
        assert_eq!(buffer.push(b"v, from 'rtmp://x/y':\n"), vec!["Input #0, flv, from 'rtmp://x/y':"]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(&[0x66, 0xff, 0x6f, b'\n']);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('f'));
    }

    #[test]
    fn test_overlong_line_is_flushed() {
        let mut buffer = LineBuffer::new();
        let chunk = vec![b'a'; MAX_LINE_BYTES + 10];
        let lines = buffer.push(&chunk);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES);
        assert_eq!(buffer.finish().map(|l| l.len()), Some(10));
    }

    #[tokio::test]
    async fn test_forward_touches_clock() {
        let clock = Arc::new(ActivityClock::new(0));
        let input: &[u8] = b"one\ntwo\n";
        forward(input, "stdout", Uuid::new_v4(), Some(clock.clone())).await;
        assert!(clock.last_activity_ms() > 0);
    }

    #[tokio::test]
    async fn test_silent_stream_leaves_clock_alone() {
        let clock = Arc::new(ActivityClock::new(0));
        let input: &[u8] = b"";
        forward(input, "stderr", Uuid::new_v4(), Some(clock.clone())).await;
        assert_eq!(clock.last_activity_ms(), 0);
    }
}
