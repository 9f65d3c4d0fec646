//! The Macco command shell.
//!
//! Each client connection gets a [`Session`] owning a freshly built
//! [`CommandRegistry`](macco_command::CommandRegistry). Commands are added
//! by layer: the built-ins (`help`, `quit`) first, then the lobby commands.
//! [`ShellServer`] drives sessions from listener events.

mod builtins;
mod context;
pub mod lobby_commands;
mod outbox;
mod server;
mod session;

pub use builtins::register_builtins;
pub use context::{Preconditions, RegistryHandle, ShellContext};
pub use lobby_commands::register_lobby_commands;
pub use outbox::{Output, PROMPT, Responder, encode};
pub use server::ShellServer;
pub use session::{DEFAULT_LAYERS, Layer, Session};
