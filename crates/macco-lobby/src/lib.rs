//! Lobby backend consumed by the shell's commands.
//!
//! [`LobbyService`] is the contract command targets call into. [`Lobby`]
//! holds the in-process lobby servers shared by every session, and
//! [`LobbyClient`] is one session's asynchronous view of them.

mod client;
mod lobby;
pub mod passwd;
mod service;

pub use client::LobbyClient;
pub use lobby::Lobby;
pub use service::{Avatar, LobbyService};
