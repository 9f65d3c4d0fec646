//! Line-framed connection listener.
//!
//! Accepts inbound TCP connections, splits received bytes into lines, and
//! reports connection lifecycle and lines as events. Designed for
//! non-blocking polling from the main loop.

use std::fmt;
use std::time::{Duration, Instant};

use macco_types::config::ListenSection;
use macco_types::error::{MaccoError, Result};

use crate::transport::{NetworkBackend, NetworkStream};

/// Maximum bytes in a single input line.
const MAX_LINE_LEN: usize = 1024;

/// Output a connection may leave unread before it is dropped.
const MAX_PENDING_OUTPUT: usize = 64 * 1024;

/// Identifies one accepted connection. Never reused within a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened on the listener since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Connected(ConnectionId),
    /// A complete line, without its terminator.
    Line(ConnectionId, String),
    /// The peer went away, errored, or idled out.
    Disconnected(ConnectionId),
}

/// Configuration for the listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub address: String,
    pub port: u16,
    /// Maximum simultaneous connections.
    pub max_connections: usize,
    /// Idle connection timeout in seconds (0 = no timeout).
    pub idle_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::from(&ListenSection::default())
    }
}

impl From<&ListenSection> for ListenerConfig {
    fn from(section: &ListenSection) -> Self {
        Self {
            address: section.address.clone(),
            port: section.port,
            max_connections: section.max_connections,
            idle_timeout_secs: section.idle_timeout_secs,
        }
    }
}

/// A single client connection.
struct Connection {
    id: ConnectionId,
    stream: Box<dyn NetworkStream>,
    /// Accumulates partial line data between polls.
    read_buf: Vec<u8>,
    /// Output the stream has not accepted yet.
    write_buf: Vec<u8>,
    /// Dropping the rest of an overlong line until its newline.
    discarding: bool,
    /// A write failed; dropped on the next poll.
    broken: bool,
    /// Timestamp of last received data (for idle timeout).
    last_activity: Instant,
}

impl Connection {
    fn new(id: ConnectionId, stream: Box<dyn NetworkStream>) -> Self {
        Self {
            id,
            stream,
            read_buf: Vec::with_capacity(256),
            write_buf: Vec::new(),
            discarding: false,
            broken: false,
            last_activity: Instant::now(),
        }
    }

    /// Append to the pending output and write what the stream takes.
    fn queue(&mut self, data: &[u8]) -> Result<()> {
        if self.write_buf.len() + data.len() > MAX_PENDING_OUTPUT {
            log::warn!(
                "connection {} has {} bytes unread, dropping it",
                self.id,
                self.write_buf.len()
            );
            return Err(MaccoError::Backend(format!("connection {} not reading", self.id)));
        }
        self.write_buf.extend_from_slice(data);
        self.flush()
    }

    /// Write pending output until the stream would block.
    fn flush(&mut self) -> Result<()> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => return Err(MaccoError::Backend("connection closed".to_string())),
                Ok(n) => {
                    self.write_buf.drain(..n);
                },
                Err(MaccoError::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Split received bytes into lines. A line longer than
    /// `MAX_LINE_LEN` is answered with an error and skipped up to its
    /// newline.
    fn frame(&mut self, data: &[u8], events: &mut Vec<ListenerEvent>) -> Result<()> {
        for &byte in data {
            if byte == b'\n' {
                if !std::mem::take(&mut self.discarding) {
                    let line = String::from_utf8_lossy(&self.read_buf)
                        .trim_end_matches('\r')
                        .to_string();
                    events.push(ListenerEvent::Line(self.id, line));
                }
                self.read_buf.clear();
            } else if self.discarding {
                continue;
            } else if self.read_buf.len() >= MAX_LINE_LEN {
                log::debug!("connection {} sent an overlong line", self.id);
                self.read_buf.clear();
                self.discarding = true;
                self.queue(b"Error: line too long\n")?;
            } else {
                self.read_buf.push(byte);
            }
        }
        Ok(())
    }

    /// Read what is available and push complete lines. Returns `false`
    /// once the connection should be dropped.
    fn service(&mut self, idle_limit: Option<Duration>, events: &mut Vec<ListenerEvent>) -> bool {
        if self.broken {
            return false;
        }
        if idle_limit.is_some_and(|limit| self.last_activity.elapsed() > limit) {
            log::info!("connection {} idle, closing", self.id);
            let _ = self.queue(b"\nIdle timeout. Goodbye.\n");
            return false;
        }
        if let Err(e) = self.flush() {
            log::debug!("connection {} write error: {e}", self.id);
            return false;
        }

        let mut chunk = [0u8; 512];
        let n = match self.stream.read(&mut chunk) {
            Ok(0) => return false,
            Ok(n) => n,
            Err(MaccoError::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => return true,
            Err(e) => {
                log::debug!("connection {} read error: {e}", self.id);
                return false;
            },
        };

        self.last_activity = Instant::now();
        match self.frame(&chunk[..n], events) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("connection {} write error: {e}", self.id);
                false
            },
        }
    }
}

/// Listener that manages client connections.
///
/// Call `poll()` each tick from the main loop and feed the returned events
/// to the shell, then write responses back with `send()`.
pub struct LineListener {
    config: ListenerConfig,
    connections: Vec<Connection>,
    next_id: u64,
    listening: bool,
}

impl LineListener {
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            connections: Vec::new(),
            next_id: 1,
            listening: false,
        }
    }

    /// Start listening on the configured address and port.
    pub fn start(&mut self, backend: &mut dyn NetworkBackend) -> Result<()> {
        backend.listen(&self.config.address, self.config.port)?;
        self.listening = true;
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.connections.iter().any(|c| c.id == id)
    }

    fn accept_pending(&mut self, backend: &mut dyn NetworkBackend, events: &mut Vec<ListenerEvent>) {
        loop {
            match backend.accept() {
                Ok(Some(mut stream)) => {
                    if self.connections.len() >= self.config.max_connections {
                        log::warn!("rejecting connection: limit of {} reached", self.config.max_connections);
                        let _ = stream.write(b"Too many connections.\n");
                        let _ = stream.close();
                        continue;
                    }
                    let id = ConnectionId(self.next_id);
                    self.next_id += 1;
                    log::info!("connection {id} opened");
                    self.connections.push(Connection::new(id, stream));
                    events.push(ListenerEvent::Connected(id));
                },
                Ok(None) => break,
                Err(e) => {
                    log::warn!("accept error: {e}");
                    break;
                },
            }
        }
    }

    /// Accept new connections and read from existing ones.
    pub fn poll(&mut self, backend: &mut dyn NetworkBackend) -> Vec<ListenerEvent> {
        if !self.listening {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.accept_pending(backend, &mut events);

        let idle_limit = (self.config.idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.config.idle_timeout_secs));
        let mut closed = Vec::new();
        self.connections.retain_mut(|conn| {
            let open = conn.service(idle_limit, &mut events);
            if !open {
                let _ = conn.stream.close();
                closed.push(conn.id);
            }
            open
        });

        for id in closed {
            log::info!("connection {id} closed");
            events.push(ListenerEvent::Disconnected(id));
        }
        events
    }

    /// Write raw bytes to one connection. Whatever the stream does not
    /// take now is kept and written on later polls. On error the
    /// connection is reported as `Disconnected` by the next poll.
    pub fn send(&mut self, id: ConnectionId, data: &[u8]) -> Result<()> {
        let conn = self
            .connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| MaccoError::Backend(format!("unknown connection {id}")))?;
        if let Err(e) = conn.queue(data) {
            conn.broken = true;
            return Err(MaccoError::Backend(format!("send: {e}")));
        }
        Ok(())
    }

    /// Close a connection at the server's request. No `Disconnected` event
    /// is produced for it. Returns whether the connection was open.
    pub fn close(&mut self, id: ConnectionId) -> bool {
        let Some(idx) = self.connections.iter().position(|c| c.id == id) else {
            return false;
        };
        let mut conn = self.connections.remove(idx);
        let _ = conn.flush();
        if !conn.write_buf.is_empty() {
            log::debug!("connection {id} closed with {} bytes unsent", conn.write_buf.len());
        }
        let _ = conn.stream.close();
        log::info!("connection {id} closed by server");
        true
    }

    /// Shut down all connections and stop listening.
    pub fn stop(&mut self) {
        for conn in &mut self.connections {
            let _ = conn.queue(b"\nServer shutting down.\n");
            let _ = conn.stream.close();
        }
        self.connections.clear();
        self.listening = false;
    }
}
