//! Networking: transport traits, the `std::net` backend, an in-memory
//! backend, and the line-framed listener that feeds client lines into shell
//! sessions.

mod listener;
pub mod memory;
mod std_backend;
mod transport;

pub use listener::{ConnectionId, LineListener, ListenerConfig, ListenerEvent};
pub use memory::{MemoryBackend, MemoryPeer};
pub use std_backend::{StdNetworkBackend, StdNetworkStream};
pub use transport::{NetworkBackend, NetworkStream};
