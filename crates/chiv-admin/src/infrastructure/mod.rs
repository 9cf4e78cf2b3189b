//! Infrastructure layer for the admin helper.
//!
//! Contains the OS-facing adapters: the clipboard thread, the console reader
//! and presenter, the HTTP backend, and config/credential storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `chiv_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod backend;
pub mod clipboard;
pub mod console;
pub mod storage;
