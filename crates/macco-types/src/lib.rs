//! Foundation types shared by all Macco crates.
//!
//! Contains the workspace error type, the TOML configuration model, and the
//! single-threaded deferred result used by asynchronous lobby operations.

pub mod config;
pub mod deferred;
pub mod error;

/// Version of the Macco shell, as reported in the connection banner.
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
