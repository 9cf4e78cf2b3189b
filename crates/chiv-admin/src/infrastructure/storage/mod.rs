//! Storage infrastructure: the config file and the credentials file.
//!
//! Both live in the same per-user directory (see [`config::config_dir`]).

pub mod config;
pub mod credentials;
