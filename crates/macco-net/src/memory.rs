//! In-memory transport for driving the listener without sockets.
//!
//! [`MemoryBackend::connect`] queues a server-side stream for the next
//! `accept()` and returns the client's end as a [`MemoryPeer`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use macco_types::error::{MaccoError, Result};

use crate::transport::{NetworkBackend, NetworkStream};

#[derive(Default)]
struct Pipe {
    /// Bytes sent by the peer, not yet read by the server.
    inbound: VecDeque<u8>,
    /// Bytes written by the server.
    outbound: Vec<u8>,
    peer_hung_up: bool,
    server_closed: bool,
    /// The peer stopped reading; writes would block.
    stalled: bool,
}

/// Server-side end of an in-memory connection.
pub struct MemoryStream {
    pipe: Rc<RefCell<Pipe>>,
}

impl NetworkStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.inbound.is_empty() {
            if pipe.peer_hung_up {
                return Ok(0);
            }
            return Err(MaccoError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
        }
        let n = buf.len().min(pipe.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.server_closed || pipe.peer_hung_up {
            return Err(MaccoError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        if pipe.stalled {
            return Err(MaccoError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
        }
        pipe.outbound.extend_from_slice(data);
        Ok(data.len())
    }

    fn close(&mut self) -> Result<()> {
        self.pipe.borrow_mut().server_closed = true;
        Ok(())
    }
}

/// Client-side end of an in-memory connection.
#[derive(Clone)]
pub struct MemoryPeer {
    pipe: Rc<RefCell<Pipe>>,
}

impl MemoryPeer {
    /// Queue raw text for the server.
    pub fn send(&self, text: &str) {
        self.pipe.borrow_mut().inbound.extend(text.as_bytes());
    }

    /// Queue `line` followed by a newline.
    pub fn send_line(&self, line: &str) {
        self.send(line);
        self.send("\n");
    }

    /// Everything the server wrote since the last call.
    pub fn take_output(&self) -> String {
        let bytes = std::mem::take(&mut self.pipe.borrow_mut().outbound);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Close the client's end; the server reads EOF.
    pub fn hang_up(&self) {
        self.pipe.borrow_mut().peer_hung_up = true;
    }

    /// Stop or resume taking the server's output, like a client that
    /// does not read its socket.
    pub fn set_stalled(&self, stalled: bool) {
        self.pipe.borrow_mut().stalled = stalled;
    }

    /// Whether the server closed the connection.
    pub fn is_closed(&self) -> bool {
        self.pipe.borrow().server_closed
    }
}

/// Backend whose connections are created by the test or caller.
#[derive(Default)]
pub struct MemoryBackend {
    listening: bool,
    incoming: VecDeque<MemoryStream>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection that the next `accept()` returns.
    pub fn connect(&mut self) -> MemoryPeer {
        let pipe = Rc::new(RefCell::new(Pipe::default()));
        self.incoming.push_back(MemoryStream {
            pipe: Rc::clone(&pipe),
        });
        MemoryPeer { pipe }
    }
}

impl NetworkBackend for MemoryBackend {
    fn listen(&mut self, _address: &str, _port: u16) -> Result<()> {
        self.listening = true;
        Ok(())
    }

    fn accept(&mut self) -> Result<Option<Box<dyn NetworkStream>>> {
        if !self.listening {
            return Err(MaccoError::Backend("not listening".to_string()));
        }
        Ok(self
            .incoming
            .pop_front()
            .map(|s| Box::new(s) as Box<dyn NetworkStream>))
    }
}
