//! One session's asynchronous view of the lobby.

use std::cell::RefCell;

use macco_types::deferred::{Deferred, Resolver};
use macco_types::error::{MaccoError, Result};

use crate::lobby::Lobby;
use crate::service::{Avatar, LobbyService};

/// An operation waiting for the next poll.
enum PendingOp {
    Connect {
        host: String,
        port: u16,
        resolver: Resolver<()>,
    },
    Register {
        username: String,
        password: String,
        resolver: Resolver<()>,
    },
    Login {
        username: String,
        password: String,
        resolver: Resolver<Avatar>,
    },
    CreateTable {
        name: String,
        resolver: Resolver<()>,
    },
    JoinTable {
        name: String,
        resolver: Resolver<()>,
    },
    LeaveTable {
        name: String,
        resolver: Resolver<()>,
    },
}

#[derive(Debug, Default)]
struct ClientState {
    server: Option<usize>,
    host: Option<String>,
    avatar: Option<Avatar>,
}

/// Per-session lobby client.
///
/// Every operation except `disconnect` is queued and completed by the next
/// [`LobbyService::poll`], so session fields only change between lines.
pub struct LobbyClient {
    lobby: Lobby,
    state: RefCell<ClientState>,
    pending: RefCell<Vec<PendingOp>>,
}

impl LobbyClient {
    pub(crate) fn new(lobby: Lobby) -> Self {
        Self {
            lobby,
            state: RefCell::new(ClientState::default()),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Number of queued operations.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    fn enqueue(&self, op: PendingOp) {
        self.pending.borrow_mut().push(op);
    }

    fn server(&self) -> Result<usize> {
        self.state
            .borrow()
            .server
            .ok_or_else(|| MaccoError::Collaborator("Not connected.".to_string()))
    }

    fn seat(&self) -> Result<(usize, String)> {
        let server = self.server()?;
        let state = self.state.borrow();
        let avatar = state
            .avatar
            .as_ref()
            .ok_or_else(|| MaccoError::Collaborator("Not logged in.".to_string()))?;
        Ok((server, avatar.username.clone()))
    }

    /// Log the current avatar out of its server, if any.
    fn release_avatar(&self) {
        let (server, avatar) = {
            let mut state = self.state.borrow_mut();
            (state.server, state.avatar.take())
        };
        if let (Some(server), Some(avatar)) = (server, avatar) {
            self.lobby.logout(server, &avatar.username);
        }
    }

    fn complete_connect(&self, host: String, port: u16) -> Result<()> {
        let server = self.lobby.resolve(&host, port)?;
        if let Some(previous) = self.state.borrow().host.as_deref() {
            log::warn!("connection to {previous} replaced by {host}:{port}");
        }
        self.release_avatar();
        let mut state = self.state.borrow_mut();
        state.server = Some(server);
        state.host = Some(host);
        Ok(())
    }

    fn complete_login(&self, username: &str, password: &str) -> Result<Avatar> {
        let server = self.server()?;
        if self.state.borrow().avatar.is_some() {
            return Err(MaccoError::Collaborator("Already logged in.".to_string()));
        }
        let avatar = self.lobby.login(server, username, password)?;
        self.state.borrow_mut().avatar = Some(avatar.clone());
        Ok(avatar)
    }
}

impl LobbyService for LobbyClient {
    fn connect(&self, host: &str, port: u16) -> Deferred<()> {
        let (deferred, resolver) = Deferred::pending();
        self.enqueue(PendingOp::Connect {
            host: host.to_string(),
            port,
            resolver,
        });
        deferred
    }

    fn disconnect(&self) {
        self.release_avatar();
        let mut state = self.state.borrow_mut();
        state.server = None;
        state.host = None;
    }

    fn register(&self, username: &str, password: &str) -> Deferred<()> {
        let (deferred, resolver) = Deferred::pending();
        self.enqueue(PendingOp::Register {
            username: username.to_string(),
            password: password.to_string(),
            resolver,
        });
        deferred
    }

    fn login(&self, username: &str, password: &str) -> Deferred<Avatar> {
        let (deferred, resolver) = Deferred::pending();
        self.enqueue(PendingOp::Login {
            username: username.to_string(),
            password: password.to_string(),
            resolver,
        });
        deferred
    }

    fn create_table(&self, name: &str) -> Deferred<()> {
        let (deferred, resolver) = Deferred::pending();
        self.enqueue(PendingOp::CreateTable {
            name: name.to_string(),
            resolver,
        });
        deferred
    }

    fn join_table(&self, name: &str) -> Deferred<()> {
        let (deferred, resolver) = Deferred::pending();
        self.enqueue(PendingOp::JoinTable {
            name: name.to_string(),
            resolver,
        });
        deferred
    }

    fn leave_table(&self, name: &str) -> Deferred<()> {
        let (deferred, resolver) = Deferred::pending();
        self.enqueue(PendingOp::LeaveTable {
            name: name.to_string(),
            resolver,
        });
        deferred
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().server.is_some()
    }

    fn host(&self) -> Option<String> {
        self.state.borrow().host.clone()
    }

    fn avatar(&self) -> Option<Avatar> {
        self.state.borrow().avatar.clone()
    }

    fn users(&self) -> Vec<String> {
        match self.state.borrow().server {
            Some(server) => self.lobby.users(server),
            None => Vec::new(),
        }
    }

    fn tables(&self) -> Vec<String> {
        match self.state.borrow().server {
            Some(server) => self.lobby.tables(server),
            None => Vec::new(),
        }
    }

    fn poll(&self) -> usize {
        // Operations queued by continuations wait for the next poll.
        let ops = std::mem::take(&mut *self.pending.borrow_mut());
        let completed = ops.len();
        for op in ops {
            match op {
                PendingOp::Connect {
                    host,
                    port,
                    resolver,
                } => {
                    log::debug!("completing connect to {host}:{port}");
                    resolver.resolve(self.complete_connect(host, port));
                },
                PendingOp::Register {
                    username,
                    password,
                    resolver,
                } => {
                    let outcome = self
                        .server()
                        .and_then(|s| self.lobby.register(s, &username, &password));
                    resolver.resolve(outcome);
                },
                PendingOp::Login {
                    username,
                    password,
                    resolver,
                } => {
                    resolver.resolve(self.complete_login(&username, &password));
                },
                PendingOp::CreateTable { name, resolver } => {
                    let outcome = self
                        .seat()
                        .and_then(|(s, _)| self.lobby.create_table(s, &name));
                    resolver.resolve(outcome);
                },
                PendingOp::JoinTable { name, resolver } => {
                    let outcome = self
                        .seat()
                        .and_then(|(s, user)| self.lobby.join_table(s, &user, &name));
                    resolver.resolve(outcome);
                },
                PendingOp::LeaveTable { name, resolver } => {
                    let outcome = self
                        .seat()
                        .and_then(|(s, user)| self.lobby.leave_table(s, &user, &name));
                    resolver.resolve(outcome);
                },
            }
        }
        completed
    }
}

impl Drop for LobbyClient {
    fn drop(&mut self) {
        self.release_avatar();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn lobby() -> Lobby {
        let lobby = Lobby::new();
        lobby.add_server(
            "main",
            "10.0.0.5",
            8777,
            [("alice".to_string(), "wonder".to_string())],
        );
        lobby
    }

    fn outcome<T: 'static>(deferred: Deferred<T>) -> Rc<RefCell<Option<std::result::Result<(), String>>>> {
        let slot = Rc::new(RefCell::new(None));
        let ok = Rc::clone(&slot);
        let err = Rc::clone(&slot);
        deferred.then(
            move |_| *ok.borrow_mut() = Some(Ok(())),
            move |e| *err.borrow_mut() = Some(Err(e.to_string())),
        );
        slot
    }

    #[test]
    fn connect_completes_on_poll() {
        let client = lobby().client();
        let result = outcome(client.connect("main", 8777));
        assert!(!client.is_connected());
        assert!(result.borrow().is_none());
        assert_eq!(client.pending_count(), 1);

        assert_eq!(client.poll(), 1);
        assert!(client.is_connected());
        assert_eq!(client.host().as_deref(), Some("main"));
        assert_eq!(*result.borrow(), Some(Ok(())));
    }

    #[test]
    fn connect_refused() {
        let client = lobby().client();
        let result = outcome(client.connect("elsewhere", 8777));
        client.poll();
        assert!(!client.is_connected());
        assert_eq!(
            *result.borrow(),
            Some(Err("Connection refused: elsewhere:8777".to_string()))
        );
    }

    #[test]
    fn login_sets_avatar() {
        let client = lobby().client();
        client.connect("main", 8777);
        client.poll();
        let result = outcome(client.login("alice", "wonder"));
        assert!(!client.is_authenticated());
        client.poll();
        assert_eq!(*result.borrow(), Some(Ok(())));
        assert_eq!(client.avatar().unwrap().username, "alice");
        assert_eq!(client.users(), vec!["alice"]);
    }

    #[test]
    fn login_bad_credentials() {
        let client = lobby().client();
        client.connect("main", 8777);
        client.poll();
        let result = outcome(client.login("alice", "nope"));
        client.poll();
        assert_eq!(
            *result.borrow(),
            Some(Err("Invalid username or password.".to_string()))
        );
        assert!(client.avatar().is_none());
    }

    #[test]
    fn operations_after_disconnect_fail() {
        let client = lobby().client();
        client.connect("main", 8777);
        client.poll();
        let result = outcome(client.register("bob", "builder"));
        client.disconnect();
        client.poll();
        assert_eq!(*result.borrow(), Some(Err("Not connected.".to_string())));
    }

    #[test]
    fn table_operations_need_login() {
        let client = lobby().client();
        client.connect("main", 8777);
        client.poll();
        let result = outcome(client.create_table("poker"));
        client.poll();
        assert_eq!(*result.borrow(), Some(Err("Not logged in.".to_string())));
    }

    #[test]
    fn table_round_trip() {
        let lobby = lobby();
        let client = lobby.client();
        client.connect("main", 8777);
        client.poll();
        client.login("alice", "wonder");
        client.poll();

        let created = outcome(client.create_table("poker"));
        let joined = outcome(client.join_table("poker"));
        client.poll();
        assert_eq!(*created.borrow(), Some(Ok(())));
        assert_eq!(*joined.borrow(), Some(Ok(())));
        assert_eq!(client.tables(), vec!["poker"]);
        assert_eq!(lobby.seated(0, "poker").unwrap(), vec!["alice"]);

        let left = outcome(client.leave_table("poker"));
        client.poll();
        assert_eq!(*left.borrow(), Some(Ok(())));
    }

    #[test]
    fn disconnect_logs_out() {
        let lobby = lobby();
        let client = lobby.client();
        client.connect("main", 8777);
        client.poll();
        client.login("alice", "wonder");
        client.poll();
        client.disconnect();
        assert!(!client.is_connected());
        assert!(client.avatar().is_none());
        assert!(client.users().is_empty());

        let other = lobby.client();
        other.connect("main", 8777);
        other.poll();
        assert!(other.users().is_empty());
    }

    #[test]
    fn dropping_client_logs_out() {
        let lobby = lobby();
        {
            let client = lobby.client();
            client.connect("main", 8777);
            client.poll();
            client.login("alice", "wonder");
            client.poll();
        }
        let other = lobby.client();
        other.connect("main", 8777);
        other.poll();
        assert!(other.users().is_empty());
    }

    #[test]
    fn sessions_share_rosters() {
        let lobby = lobby();
        let first = lobby.client();
        let second = lobby.client();
        first.connect("main", 8777);
        second.connect("10.0.0.5", 8777);
        first.poll();
        second.poll();
        first.login("alice", "wonder");
        first.poll();
        assert_eq!(second.users(), vec!["alice"]);
    }
}
