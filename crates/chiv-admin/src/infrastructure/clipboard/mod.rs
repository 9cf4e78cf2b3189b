//! Clipboard infrastructure.
//!
//! Every clipboard operation runs on ONE dedicated OS thread
//! (`chiv-clipboard`). The Win32 clipboard is tied to the thread that opened
//! it, so the port is constructed inside that thread and never leaves it.
//!
//! ```text
//!  chiv-clipboard thread                         tokio runtime
//!  ─────────────────────                         ─────────────
//!  loop every `interval`:
//!    write request pending? ── write_text ──► oneshot reply ──► ClipboardHandle::write
//!    poll_changed? ─ read_text ─► mpsc (16) ──────────────────► EventLoop
//!    shutdown? ─ exit, dropping the sender closes the stream
//! ```
//!
//! A change is emitted only when the OS change counter moved and the decoded
//! text is non-empty. Open/lock/decode failures mean "no data" for that tick.

use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::application::event_loop::ClipboardSink;
use crate::application::shutdown::ShutdownSignal;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Capacity of the queue between the watcher thread and the event loop.
pub const EVENT_QUEUE_CAPACITY: usize = 16;

/// Error type for clipboard operations.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard support on this platform")]
    Unsupported,

    #[error("clipboard could not be opened: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    WriteFailed(String),

    #[error("clipboard watcher thread has stopped")]
    WatcherStopped,

    #[error("failed to spawn clipboard thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Access to a system clipboard. Lives on the clipboard thread only.
pub trait ClipboardPort {
    /// Returns `true` once for every change of the OS change counter since
    /// the previous call (or since construction).
    fn poll_changed(&mut self) -> bool;

    /// Current clipboard content as text, if there is any.
    fn read_text(&mut self) -> Option<String>;

    /// Replaces the clipboard content with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard for platforms without a supported backend: never changes.
#[derive(Debug, Default)]
pub struct NullClipboard;

impl ClipboardPort for NullClipboard {
    fn poll_changed(&mut self) -> bool {
        false
    }

    fn read_text(&mut self) -> Option<String> {
        None
    }

    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported)
    }
}

/// The clipboard port for the current platform.
#[cfg(target_os = "windows")]
pub fn platform_clipboard() -> Box<dyn ClipboardPort> {
    Box::new(windows::WindowsClipboard::new())
}

/// The clipboard port for the current platform.
#[cfg(not(target_os = "windows"))]
pub fn platform_clipboard() -> Box<dyn ClipboardPort> {
    tracing::warn!("clipboard watching is only supported on Windows; roster refresh is disabled");
    Box::new(NullClipboard)
}

impl<P: ClipboardPort + ?Sized> ClipboardPort for Box<P> {
    fn poll_changed(&mut self) -> bool {
        (**self).poll_changed()
    }

    fn read_text(&mut self) -> Option<String> {
        (**self).read_text()
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        (**self).write_text(text)
    }
}

struct WriteRequest {
    text: String,
    reply: oneshot::Sender<Result<(), ClipboardError>>,
}

/// Sends write requests to the clipboard thread.
#[derive(Clone)]
pub struct ClipboardHandle {
    requests: std_mpsc::Sender<WriteRequest>,
}

impl ClipboardHandle {
    /// Writes `text` to the clipboard from the clipboard thread.
    ///
    /// The change caused by this write is not reported as a clipboard event.
    pub async fn write(&self, text: impl Into<String>) -> Result<(), ClipboardError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(WriteRequest {
                text: text.into(),
                reply,
            })
            .map_err(|_| ClipboardError::WatcherStopped)?;
        response.await.map_err(|_| ClipboardError::WatcherStopped)?
    }
}

#[async_trait]
impl ClipboardSink for ClipboardHandle {
    async fn write_text(&self, text: &str) -> Result<(), String> {
        self.write(text).await.map_err(|e| e.to_string())
    }
}

/// Spawns the clipboard thread.
pub struct ClipboardWatcher;

impl ClipboardWatcher {
    /// Starts polling every `interval` until `shutdown` is triggered or the
    /// receiver is dropped.
    ///
    /// `factory` runs on the new thread and builds the port there.
    pub fn spawn<F, P>(
        factory: F,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Result<(ClipboardHandle, mpsc::Receiver<String>), ClipboardError>
    where
        F: FnOnce() -> P + Send + 'static,
        P: ClipboardPort,
    {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (request_tx, request_rx) = std_mpsc::channel();

        thread::Builder::new()
            .name("chiv-clipboard".to_string())
            .spawn(move || {
                let port = factory();
                run_watcher(port, interval, event_tx, request_rx, shutdown);
            })?;

        Ok((ClipboardHandle { requests: request_tx }, event_rx))
    }
}

/// Body of the clipboard thread.
fn run_watcher<P: ClipboardPort>(
    mut port: P,
    interval: Duration,
    events: mpsc::Sender<String>,
    requests: std_mpsc::Receiver<WriteRequest>,
    shutdown: ShutdownSignal,
) {
    debug!(?interval, "clipboard watcher started");
    // `None` once every handle was dropped.
    let mut requests = Some(requests);

    loop {
        if shutdown.is_triggered() {
            break;
        }

        match requests.as_ref().map(|rx| rx.recv_timeout(interval)) {
            Some(Ok(request)) => {
                let result = port.write_text(&request.text);
                if result.is_ok() {
                    // Absorb the change caused by our own write.
                    port.poll_changed();
                }
                let _ = request.reply.send(result);
                continue;
            }
            Some(Err(std_mpsc::RecvTimeoutError::Timeout)) => {}
            Some(Err(std_mpsc::RecvTimeoutError::Disconnected)) => {
                requests = None;
                thread::sleep(interval);
            }
            None => thread::sleep(interval),
        }

        if shutdown.is_triggered() {
            break;
        }
        if !port.poll_changed() {
            continue;
        }
        match port.read_text() {
            Some(text) if !text.is_empty() => {
                if events.blocking_send(text).is_err() {
                    debug!("clipboard consumer gone");
                    break;
                }
            }
            _ => trace!("clipboard changed without readable text"),
        }
    }

    debug!("clipboard watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::mock::MockClipboard;
    use super::*;

    const TICK: Duration = Duration::from_millis(5);

    #[test]
    fn test_null_clipboard_never_changes() {
        let mut clipboard = NullClipboard;
        assert!(!clipboard.poll_changed());
        assert_eq!(clipboard.read_text(), None);
        assert!(matches!(
            clipboard.write_text("x"),
            Err(ClipboardError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_watcher_emits_each_change_once() {
        // Arrange
        let clipboard = MockClipboard::new();
        let shutdown = ShutdownSignal::new();
        let port = clipboard.clone();
        let (_handle, mut rx) =
            ClipboardWatcher::spawn(move || port, TICK, shutdown.clone()).unwrap();

        // Act
        clipboard.set_text("first");
        let first = rx.recv().await;
        clipboard.set_text("second");
        let second = rx.recv().await;

        // Assert
        assert_eq!(first.as_deref(), Some("first"));
        assert_eq!(second.as_deref(), Some("second"));
        shutdown.trigger();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_watcher_skips_empty_text() {
        let clipboard = MockClipboard::new();
        let shutdown = ShutdownSignal::new();
        let port = clipboard.clone();
        let (_handle, mut rx) =
            ClipboardWatcher::spawn(move || port, TICK, shutdown.clone()).unwrap();

        clipboard.set_text("");
        clipboard.set_non_text();
        clipboard.set_text("real");

        assert_eq!(rx.recv().await.as_deref(), Some("real"));
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_stream_closes_on_shutdown() {
        let shutdown = ShutdownSignal::new();
        let (_handle, mut rx) =
            ClipboardWatcher::spawn(MockClipboard::new, TICK, shutdown.clone()).unwrap();

        shutdown.trigger();

        let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert_eq!(closed.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_runs_on_watcher_thread_without_echo() {
        // Arrange
        let clipboard = MockClipboard::new();
        let shutdown = ShutdownSignal::new();
        let port = clipboard.clone();
        let (handle, mut rx) =
            ClipboardWatcher::spawn(move || port, TICK, shutdown.clone()).unwrap();

        // Act
        handle.write("kickbyid ABC").await.unwrap();
        clipboard.set_text("after");

        // Assert
        assert_eq!(clipboard.text().as_deref(), Some("after"));
        assert_eq!(clipboard.writes(), vec!["kickbyid ABC".to_string()]);
        assert_eq!(rx.recv().await.as_deref(), Some("after"));
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_write_after_shutdown_reports_stopped_watcher() {
        let shutdown = ShutdownSignal::new();
        let (handle, mut rx) =
            ClipboardWatcher::spawn(MockClipboard::new, TICK, shutdown.clone()).unwrap();
        shutdown.trigger();
        assert_eq!(rx.recv().await, None);

        let err = handle.write("x").await.unwrap_err();

        assert!(matches!(err, ClipboardError::WatcherStopped));
    }
}
