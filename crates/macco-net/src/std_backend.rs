//! `std::net` implementation of the transport traits.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use macco_types::error::{MaccoError, Result};

use crate::transport::{NetworkBackend, NetworkStream};

/// Non-blocking TCP stream.
pub struct StdNetworkStream {
    stream: TcpStream,
}

impl StdNetworkStream {
    fn new(stream: TcpStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl NetworkStream for StdNetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.stream.read(buf)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        match self.stream.write(data) {
            Ok(0) if !data.is_empty() => Err(MaccoError::Backend("connection closed".to_string())),
            Ok(n) => Ok(n),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// TCP backend over non-blocking `std::net` sockets.
#[derive(Default)]
pub struct StdNetworkBackend {
    listener: Option<TcpListener>,
}

impl StdNetworkBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address actually bound, useful when listening on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref()?.local_addr().ok()
    }
}

impl NetworkBackend for StdNetworkBackend {
    fn listen(&mut self, address: &str, port: u16) -> Result<()> {
        let listener = TcpListener::bind((address, port))
            .map_err(|e| MaccoError::Backend(format!("bind {address}:{port}: {e}")))?;
        listener.set_nonblocking(true)?;
        log::info!("listening on {address}:{port}");
        self.listener = Some(listener);
        Ok(())
    }

    fn accept(&mut self) -> Result<Option<Box<dyn NetworkStream>>> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| MaccoError::Backend("not listening".to_string()))?;
        match listener.accept() {
            Ok((stream, peer)) => {
                log::debug!("accepted connection from {peer}");
                Ok(Some(Box::new(StdNetworkStream::new(stream)?)))
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
