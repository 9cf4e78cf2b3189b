//! Domain entities for chiv-admin-helper.
//!
//! - **`player`** – Records produced by the roster parser ([`player::ConnectedPlayer`])
//!   and returned by the validation backend ([`player::ValidatedPlayer`]).
//! - **`session`** – [`session::SessionState`], the single owner of the active
//!   roster and the process-lifetime trust set.

pub mod player;
pub mod session;
