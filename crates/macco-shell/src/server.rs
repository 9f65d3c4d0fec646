//! Host loop: listener events in, session output back out.

use std::collections::BTreeMap;
use std::rc::Rc;

use macco_lobby::Lobby;
use macco_net::{ConnectionId, LineListener, ListenerConfig, ListenerEvent, NetworkBackend};
use macco_types::config::{MaccoConfig, ShellSection};
use macco_types::error::Result;

use crate::outbox::encode;
use crate::session::Session;

/// Serves one [`Session`] per accepted connection.
///
/// Call [`ShellServer::tick`] from the main loop until it reports that the
/// server stopped.
pub struct ShellServer {
    listener: LineListener,
    lobby: Lobby,
    shell: ShellSection,
    sessions: BTreeMap<ConnectionId, Session>,
    running: bool,
}

impl ShellServer {
    pub fn new(config: &MaccoConfig, lobby: Lobby) -> Self {
        Self {
            listener: LineListener::new(ListenerConfig::from(&config.listen)),
            lobby,
            shell: config.shell.clone(),
            sessions: BTreeMap::new(),
            running: false,
        }
    }

    /// Bind the listener.
    pub fn start(&mut self, backend: &mut dyn NetworkBackend) -> Result<()> {
        self.listener.start(backend)?;
        self.running = true;
        log::info!("shell server started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Run one iteration of the loop. Returns whether the server is still
    /// running afterwards.
    pub fn tick(&mut self, backend: &mut dyn NetworkBackend) -> bool {
        if !self.running {
            return false;
        }

        for event in self.listener.poll(backend) {
            match event {
                ListenerEvent::Connected(id) => self.open_session(id),
                ListenerEvent::Line(id, line) => {
                    if let Some(session) = self.sessions.get(&id) {
                        session.line_received(&line);
                    }
                    self.flush(id);
                },
                ListenerEvent::Disconnected(id) => self.drop_session(id),
            }
        }

        for session in self.sessions.values() {
            session.poll();
        }
        let ids: Vec<ConnectionId> = self.sessions.keys().copied().collect();
        for id in ids {
            self.flush(id);
        }

        self.running
    }

    fn open_session(&mut self, id: ConnectionId) {
        let client = Rc::new(self.lobby.client());
        match Session::new(client, &self.shell) {
            Ok(session) => {
                session.connection_made();
                self.sessions.insert(id, session);
                self.flush(id);
            },
            Err(e) => {
                log::error!("could not build session for {id}: {e}");
                self.listener.close(id);
            },
        }
    }

    /// Write a session's queued output, closing the connection if asked to.
    fn flush(&mut self, id: ConnectionId) {
        let Some(session) = self.sessions.get(&id) else {
            return;
        };
        let (bytes, close) = encode(&session.drain_output());
        if !bytes.is_empty()
            && let Err(e) = self.listener.send(id, &bytes)
        {
            log::debug!("write to {id} failed: {e}");
        }
        if close {
            self.listener.close(id);
            self.drop_session(id);
        }
    }

    fn drop_session(&mut self, id: ConnectionId) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        session.connection_lost();
        log::info!("session {id} ended");

        if self.shell.exit_on_last_disconnect && self.sessions.is_empty() {
            log::info!("last connection closed, shutting down");
            self.shutdown();
        }
    }

    /// Close every connection and stop listening.
    pub fn shutdown(&mut self) {
        self.listener.stop();
        self.sessions.clear();
        self.running = false;
    }
}
