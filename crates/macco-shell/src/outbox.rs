//! Response queue between command targets and the transport.

use std::cell::RefCell;
use std::rc::Rc;

/// Prompt written after most responses.
pub const PROMPT: &str = ">>> ";

/// One unit of output for a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A line of text; a newline is appended on the wire.
    Line(String),
    Prompt,
    /// Close the connection after everything queued before it.
    Close,
}

#[derive(Debug, Default)]
struct Outbox {
    queue: Vec<Output>,
    closed: bool,
}

/// Cloneable handle that command targets and their continuations write
/// through. Once the connection is gone, writes are dropped.
#[derive(Debug, Clone, Default)]
pub struct Responder {
    outbox: Rc<RefCell<Outbox>>,
}

impl Responder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, output: Output) {
        let mut outbox = self.outbox.borrow_mut();
        if outbox.closed {
            log::debug!("dropping output for closed connection: {output:?}");
            return;
        }
        outbox.queue.push(output);
    }

    /// Send a line followed by the prompt.
    pub fn send_line(&self, text: impl Into<String>) {
        self.push(Output::Line(text.into()));
        self.push(Output::Prompt);
    }

    /// Send a line without a prompt.
    pub fn announce(&self, text: impl Into<String>) {
        self.push(Output::Line(text.into()));
    }

    pub fn prompt(&self) {
        self.push(Output::Prompt);
    }

    /// Ask the host to close the connection.
    pub fn close(&self) {
        self.push(Output::Close);
    }

    /// The transport is gone; drop everything from now on.
    pub fn mark_closed(&self) {
        let mut outbox = self.outbox.borrow_mut();
        outbox.closed = true;
        outbox.queue.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.outbox.borrow().closed
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<Output> {
        std::mem::take(&mut self.outbox.borrow_mut().queue)
    }
}

/// Encode outputs for the wire. Stops at the first `Close` and reports it.
pub fn encode(outputs: &[Output]) -> (Vec<u8>, bool) {
    let mut bytes = Vec::new();
    for output in outputs {
        match output {
            Output::Line(text) => {
                bytes.extend_from_slice(text.as_bytes());
                bytes.push(b'\n');
            },
            Output::Prompt => bytes.extend_from_slice(PROMPT.as_bytes()),
            Output::Close => return (bytes, true),
        }
    }
    (bytes, false)
}
