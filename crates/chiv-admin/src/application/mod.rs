//! Application layer use cases for the admin helper.
//!
//! Use cases orchestrate `chiv_core` types to serve the operator and talk to
//! the outside world only through the traits defined here:
//!
//! - [`backend::BackendClient`] for validation and moderation calls,
//! - [`event_loop::Presenter`] for everything the operator sees,
//! - [`event_loop::ClipboardSink`] for copying commands back to the clipboard.
//!
//! No OS calls, no HTTP, no file system access.
//!
//! # Sub-modules
//!
//! - **`event_loop`** – Single consumer of clipboard and console events. Owns
//!   the session and runs every state transition.
//!
//! - **`dispatch_command`** – Turns one console line into an operator command
//!   or a notice.
//!
//! - **`shutdown`** – Cooperative stop flag shared with the producer threads.

pub mod backend;
pub mod dispatch_command;
pub mod event_loop;
pub mod shutdown;
