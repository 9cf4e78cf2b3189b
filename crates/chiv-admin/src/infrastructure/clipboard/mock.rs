//! Scripted clipboard for tests.
//!
//! Clones share the clipboard content and change counter, but each clone
//! tracks its own "last seen" counter, just like two processes watching the
//! same system clipboard.

use std::sync::{Arc, Mutex};

use super::{ClipboardError, ClipboardPort};

#[derive(Debug, Default)]
struct Shared {
    text: Option<String>,
    sequence: u64,
    writes: Vec<String>,
}

/// In-memory [`ClipboardPort`] driven by the test.
#[derive(Debug, Clone, Default)]
pub struct MockClipboard {
    shared: Arc<Mutex<Shared>>,
    last_seen: u64,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates another program copying `text`.
    pub fn set_text(&self, text: impl Into<String>) {
        let mut shared = self.shared.lock().expect("lock poisoned");
        shared.text = Some(text.into());
        shared.sequence += 1;
    }

    /// Simulates a copy of something that is not text (an image, files, ...).
    pub fn set_non_text(&self) {
        let mut shared = self.shared.lock().expect("lock poisoned");
        shared.text = None;
        shared.sequence += 1;
    }

    pub fn text(&self) -> Option<String> {
        self.shared.lock().expect("lock poisoned").text.clone()
    }

    /// Everything written through [`ClipboardPort::write_text`], oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.shared.lock().expect("lock poisoned").writes.clone()
    }

    pub fn sequence(&self) -> u64 {
        self.shared.lock().expect("lock poisoned").sequence
    }
}

impl ClipboardPort for MockClipboard {
    fn poll_changed(&mut self) -> bool {
        let sequence = self.sequence();
        let changed = sequence != self.last_seen;
        self.last_seen = sequence;
        changed
    }

    fn read_text(&mut self) -> Option<String> {
        self.text()
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut shared = self.shared.lock().expect("lock poisoned");
        shared.text = Some(text.to_string());
        shared.sequence += 1;
        shared.writes.push(text.to_string());
        Ok(())
    }
}
