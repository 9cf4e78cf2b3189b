//! Operator console: line input on a dedicated thread and terminal output.
//!
//! [`ConsoleWatcher`] turns a blocking line reader (stdin in production) into
//! a bounded tokio channel of trimmed, non-empty lines. Shutdown is checked
//! once per line, so a thread blocked in `read_line` exits after the next line
//! or at end of input.

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::shutdown::ShutdownSignal;

pub mod mock;
pub mod presenter;

/// Capacity of the queue between the console thread and the event loop.
pub const LINE_QUEUE_CAPACITY: usize = 16;

/// Spawns the console reader thread.
pub struct ConsoleWatcher;

impl ConsoleWatcher {
    /// Reads `reader` line by line until end of input, a read error, or shutdown.
    ///
    /// The returned stream closes in all three cases.
    pub fn spawn<R>(reader: R, shutdown: ShutdownSignal) -> std::io::Result<mpsc::Receiver<String>>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_QUEUE_CAPACITY);
        thread::Builder::new()
            .name("chiv-console".to_string())
            .spawn(move || run_reader(reader, tx, shutdown))?;
        Ok(rx)
    }
}

fn run_reader<R: BufRead>(mut reader: R, lines: mpsc::Sender<String>, shutdown: ShutdownSignal) {
    debug!("console watcher started");
    let mut buffer = String::new();

    while !shutdown.is_triggered() {
        buffer.clear();
        match reader.read_line(&mut buffer) {
            Ok(0) => {
                debug!("console input reached end of file");
                break;
            }
            Ok(_) => {
                let line = buffer.trim();
                if line.is_empty() || shutdown.is_triggered() {
                    continue;
                }
                if lines.blocking_send(line.to_string()).is_err() {
                    debug!("console consumer gone");
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "console read failed");
                break;
            }
        }
    }

    debug!("console watcher stopped");
}
