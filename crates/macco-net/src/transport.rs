//! Transport traits implemented by the TCP backend and by test doubles.

use macco_types::error::Result;

/// A bidirectional, non-blocking byte stream.
///
/// `read` reports "no data yet" as `MaccoError::Io` with
/// `ErrorKind::WouldBlock`, and end of stream as `Ok(0)`. `write` may take
/// only part of `data`, and reports a full send buffer the same way.
pub trait NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn write(&mut self, data: &[u8]) -> Result<usize>;

    fn close(&mut self) -> Result<()>;
}

/// Accepts inbound connections.
pub trait NetworkBackend {
    /// Start listening on `address:port`.
    fn listen(&mut self, address: &str, port: u16) -> Result<()>;

    /// Accept one pending connection without blocking.
    fn accept(&mut self) -> Result<Option<Box<dyn NetworkStream>>>;
}
