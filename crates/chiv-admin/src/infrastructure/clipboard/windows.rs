//! Win32 clipboard adapter.
//!
//! Change detection uses `GetClipboardSequenceNumber`, so polling never opens
//! the clipboard. Only a detected change triggers the open/lock/copy protocol.
//!
//! The clipboard is owned per thread: an instance must be created and used on
//! the same thread, which [`super::ClipboardWatcher`] guarantees.
//!
//! # Safety
//!
//! `unsafe` is used only for Win32 FFI calls, each annotated with `// SAFETY:`.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use std::thread;
use std::time::Duration;

use tracing::trace;
use windows::Win32::Foundation::{HANDLE, HGLOBAL};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, GetClipboardSequenceNumber,
    IsClipboardFormatAvailable, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE};
use windows::Win32::System::Ole::CF_UNICODETEXT;

use super::{ClipboardError, ClipboardPort};

/// Wait between `OpenClipboard` attempts while another program holds it.
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Gives up opening the clipboard after this many attempts.
const OPEN_MAX_ATTEMPTS: u32 = 1_000;

/// System clipboard accessed through Win32.
pub struct WindowsClipboard {
    last_sequence: u32,
}

impl WindowsClipboard {
    /// Records the current change counter; content copied before this call is
    /// never reported.
    pub fn new() -> Self {
        Self {
            // SAFETY: no preconditions; reads a process-independent counter.
            last_sequence: unsafe { GetClipboardSequenceNumber() },
        }
    }
}

impl Default for WindowsClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardPort for WindowsClipboard {
    fn poll_changed(&mut self) -> bool {
        // SAFETY: no preconditions.
        let sequence = unsafe { GetClipboardSequenceNumber() };
        let changed = sequence != self.last_sequence;
        self.last_sequence = sequence;
        changed
    }

    fn read_text(&mut self) -> Option<String> {
        match read_unicode_text() {
            Ok(text) => text,
            Err(e) => {
                trace!(error = %e, "clipboard read failed");
                None
            }
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let _open = ClipboardGuard::open()?;

        // SAFETY: the clipboard is open on this thread.
        unsafe { EmptyClipboard() }.map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;

        let units: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        let bytes = units.len() * std::mem::size_of::<u16>();

        // SAFETY: plain allocation; freed below on every failure path.
        let memory = unsafe { GlobalAlloc(GMEM_MOVEABLE, bytes) }
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;

        if let Err(e) = copy_into(memory, &units) {
            // SAFETY: `memory` is still owned by us.
            let _ = unsafe { GlobalFree(Some(memory)) };
            return Err(e);
        }

        // SAFETY: the clipboard is open and `memory` holds a NUL-terminated
        // UTF-16 string. On success the system owns `memory`.
        if let Err(e) = unsafe { SetClipboardData(u32::from(CF_UNICODETEXT.0), Some(HANDLE(memory.0))) } {
            // SAFETY: ownership did not pass to the system.
            let _ = unsafe { GlobalFree(Some(memory)) };
            return Err(ClipboardError::WriteFailed(e.to_string()));
        }
        Ok(())
    }
}

/// Runs the decode protocol. `Ok(None)` means there is no text on the clipboard.
fn read_unicode_text() -> Result<Option<String>, ClipboardError> {
    let _open = ClipboardGuard::open()?;

    // SAFETY: no preconditions.
    if unsafe { IsClipboardFormatAvailable(u32::from(CF_UNICODETEXT.0)) }.is_err() {
        return Ok(None);
    }

    // SAFETY: the clipboard is open on this thread. The handle stays owned by
    // the system and is valid until the clipboard is closed.
    let handle = unsafe { GetClipboardData(u32::from(CF_UNICODETEXT.0)) }
        .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

    let locked = GlobalLockGuard::lock(HGLOBAL(handle.0))?;
    // SAFETY: CF_UNICODETEXT data is a NUL-terminated UTF-16 string and stays
    // locked for the lifetime of `locked`.
    let units = unsafe { copy_until_nul(locked.ptr as *const u16) };
    drop(locked);

    Ok(Some(String::from_utf16_lossy(&units)))
}

/// Copies UTF-16 units up to (excluding) the first zero unit.
///
/// # Safety
///
/// `ptr` must point to a readable, NUL-terminated UTF-16 buffer.
unsafe fn copy_until_nul(ptr: *const u16) -> Vec<u16> {
    let mut units = Vec::new();
    let mut offset = 0;
    loop {
        let unit = *ptr.add(offset);
        if unit == 0 {
            return units;
        }
        units.push(unit);
        offset += 1;
    }
}

fn copy_into(memory: HGLOBAL, units: &[u16]) -> Result<(), ClipboardError> {
    let locked = GlobalLockGuard::lock(memory)?;
    // SAFETY: `memory` was allocated with room for exactly `units.len()` units.
    unsafe {
        std::ptr::copy_nonoverlapping(units.as_ptr(), locked.ptr as *mut u16, units.len());
    }
    Ok(())
}

/// Keeps the clipboard open; closes it on drop.
struct ClipboardGuard;

impl ClipboardGuard {
    /// Retries every millisecond while another program holds the clipboard.
    fn open() -> Result<Self, ClipboardError> {
        let mut last_error = None;
        for _ in 0..OPEN_MAX_ATTEMPTS {
            // SAFETY: no window owner; the clipboard is associated with this thread.
            match unsafe { OpenClipboard(None) } {
                Ok(()) => return Ok(Self),
                Err(e) => last_error = Some(e),
            }
            thread::sleep(OPEN_RETRY_DELAY);
        }
        Err(ClipboardError::Unavailable(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}

impl Drop for ClipboardGuard {
    fn drop(&mut self) {
        // SAFETY: only constructed after a successful OpenClipboard on this thread.
        let _ = unsafe { CloseClipboard() };
    }
}

/// Keeps a global memory block locked; unlocks it on drop.
struct GlobalLockGuard {
    memory: HGLOBAL,
    ptr: *mut c_void,
}

impl GlobalLockGuard {
    fn lock(memory: HGLOBAL) -> Result<Self, ClipboardError> {
        // SAFETY: `memory` is a valid movable global memory handle.
        let ptr = unsafe { GlobalLock(memory) };
        if ptr.is_null() {
            return Err(ClipboardError::Unavailable("GlobalLock failed".to_string()));
        }
        Ok(Self { memory, ptr })
    }
}

impl Drop for GlobalLockGuard {
    fn drop(&mut self) {
        // SAFETY: paired with the successful GlobalLock in `lock`. GlobalUnlock
        // reports an "error" when the lock count reaches zero, which is expected.
        let _ = unsafe { GlobalUnlock(self.memory) };
    }
}
