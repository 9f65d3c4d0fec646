//! The lobby service contract.

use macco_types::deferred::Deferred;

/// An authenticated identity on a lobby server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub username: String,
}

/// Asynchronous lobby operations plus the session fields preconditions read.
///
/// Operations return immediately; their [`Deferred`] fires on a later
/// [`LobbyService::poll`]. Readable fields always reflect committed state,
/// never operations still in flight.
pub trait LobbyService {
    fn connect(&self, host: &str, port: u16) -> Deferred<()>;

    /// Drop the connection. Completes locally and immediately.
    fn disconnect(&self);

    fn register(&self, username: &str, password: &str) -> Deferred<()>;

    fn login(&self, username: &str, password: &str) -> Deferred<Avatar>;

    fn create_table(&self, name: &str) -> Deferred<()>;

    fn join_table(&self, name: &str) -> Deferred<()>;

    fn leave_table(&self, name: &str) -> Deferred<()>;

    fn is_connected(&self) -> bool;

    /// Host given to the last successful `connect`.
    fn host(&self) -> Option<String>;

    fn avatar(&self) -> Option<Avatar>;

    /// Logged-in users on the connected server.
    fn users(&self) -> Vec<String>;

    /// Tables on the connected server.
    fn tables(&self) -> Vec<String>;

    /// Complete outstanding operations. Returns how many completed.
    fn poll(&self) -> usize;

    fn is_authenticated(&self) -> bool {
        self.avatar().is_some()
    }
}
