//! In-process lobby servers shared by all sessions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use macco_types::config::MaccoConfig;
use macco_types::error::{MaccoError, Result};

use crate::client::LobbyClient;
use crate::passwd::load_password_db;
use crate::service::Avatar;

fn failure(msg: impl Into<String>) -> MaccoError {
    MaccoError::Collaborator(msg.into())
}

#[derive(Debug)]
struct Table {
    name: String,
    seated: Vec<String>,
}

#[derive(Debug)]
struct LobbyServer {
    name: String,
    address: String,
    port: u16,
    accounts: HashMap<String, String>,
    online: Vec<String>,
    tables: Vec<Table>,
}

impl LobbyServer {
    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| failure(format!("No such table: {name}")))
    }
}

/// Handle to the lobby servers. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct Lobby {
    servers: Rc<RefCell<Vec<LobbyServer>>>,
}

impl Lobby {
    /// A lobby with no servers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one server per `[[lobby]]` entry, loading account files.
    pub fn from_config(config: &MaccoConfig) -> Result<Self> {
        let lobby = Self::new();
        for entry in &config.lobbies {
            let accounts = match &entry.password_db {
                Some(path) => load_password_db(path)?,
                None => Vec::new(),
            };
            lobby.add_server(&entry.name, &entry.address, entry.port, accounts);
        }
        Ok(lobby)
    }

    /// Add a lobby server with the given accounts.
    pub fn add_server(
        &self,
        name: &str,
        address: &str,
        port: u16,
        accounts: impl IntoIterator<Item = (String, String)>,
    ) {
        log::info!("lobby '{name}' available at {address}:{port}");
        self.servers.borrow_mut().push(LobbyServer {
            name: name.to_string(),
            address: address.to_string(),
            port,
            accounts: accounts.into_iter().collect(),
            online: Vec::new(),
            tables: Vec::new(),
        });
    }

    pub fn server_count(&self) -> usize {
        self.servers.borrow().len()
    }

    /// A new, disconnected client for one session.
    pub fn client(&self) -> LobbyClient {
        LobbyClient::new(self.clone())
    }

    /// Find the server reachable at `host:port`. `host` may be the server's
    /// address or its name.
    pub(crate) fn resolve(&self, host: &str, port: u16) -> Result<usize> {
        self.servers
            .borrow()
            .iter()
            .position(|s| s.port == port && (s.address == host || s.name == host))
            .ok_or_else(|| failure(format!("Connection refused: {host}:{port}")))
    }

    pub(crate) fn register(&self, server: usize, username: &str, password: &str) -> Result<()> {
        let mut servers = self.servers.borrow_mut();
        let srv = &mut servers[server];
        if srv.accounts.contains_key(username) {
            return Err(failure(format!("User already exists: {username}")));
        }
        srv.accounts
            .insert(username.to_string(), password.to_string());
        log::info!("lobby '{}': registered '{username}'", srv.name);
        Ok(())
    }

    pub(crate) fn login(&self, server: usize, username: &str, password: &str) -> Result<Avatar> {
        let mut servers = self.servers.borrow_mut();
        let srv = &mut servers[server];
        if srv.accounts.get(username).is_none_or(|p| p != password) {
            return Err(failure("Invalid username or password."));
        }
        if srv.online.iter().any(|u| u == username) {
            return Err(failure(format!("User already logged in: {username}")));
        }
        srv.online.push(username.to_string());
        log::info!("lobby '{}': '{username}' logged in", srv.name);
        Ok(Avatar {
            username: username.to_string(),
        })
    }

    /// Take `username` offline and out of every seat.
    pub(crate) fn logout(&self, server: usize, username: &str) {
        let mut servers = self.servers.borrow_mut();
        let Some(srv) = servers.get_mut(server) else {
            return;
        };
        srv.online.retain(|u| u != username);
        for table in &mut srv.tables {
            table.seated.retain(|u| u != username);
        }
        log::info!("lobby '{}': '{username}' logged out", srv.name);
    }

    pub(crate) fn create_table(&self, server: usize, name: &str) -> Result<()> {
        let mut servers = self.servers.borrow_mut();
        let srv = &mut servers[server];
        if srv.tables.iter().any(|t| t.name == name) {
            return Err(failure(format!("Table already exists: {name}")));
        }
        srv.tables.push(Table {
            name: name.to_string(),
            seated: Vec::new(),
        });
        Ok(())
    }

    pub(crate) fn join_table(&self, server: usize, username: &str, name: &str) -> Result<()> {
        let mut servers = self.servers.borrow_mut();
        let table = servers[server].table_mut(name)?;
        if table.seated.iter().any(|u| u == username) {
            return Err(failure(format!("Already seated at table: {name}")));
        }
        table.seated.push(username.to_string());
        Ok(())
    }

    pub(crate) fn leave_table(&self, server: usize, username: &str, name: &str) -> Result<()> {
        let mut servers = self.servers.borrow_mut();
        let table = servers[server].table_mut(name)?;
        let before = table.seated.len();
        table.seated.retain(|u| u != username);
        if table.seated.len() == before {
            return Err(failure(format!("Not seated at table: {name}")));
        }
        Ok(())
    }

    pub(crate) fn users(&self, server: usize) -> Vec<String> {
        self.servers
            .borrow()
            .get(server)
            .map(|s| s.online.clone())
            .unwrap_or_default()
    }

    pub(crate) fn tables(&self, server: usize) -> Vec<String> {
        self.servers
            .borrow()
            .get(server)
            .map(|s| s.tables.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Users seated at `table` on `server`, if the table exists.
    pub fn seated(&self, server: usize, table: &str) -> Option<Vec<String>> {
        self.servers
            .borrow()
            .get(server)?
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.seated.clone())
    }
}
