//! One client connection's shell.

use std::rc::Rc;

use macco_command::{CommandRegistry, Dispatch};
use macco_lobby::LobbyService;
use macco_types::config::ShellSection;
use macco_types::error::{MaccoError, Result};
use macco_types::version_string;

use crate::builtins::register_builtins;
use crate::context::ShellContext;
use crate::lobby_commands::register_lobby_commands;
use crate::outbox::{Output, Responder};

/// A function that adds a group of commands to a session's registry.
pub type Layer = fn(&mut CommandRegistry, &ShellContext) -> Result<()>;

/// Layers every session is built from, in help-listing order.
pub const DEFAULT_LAYERS: &[Layer] = &[register_builtins, register_lobby_commands];

/// A shell session bound to one connection and one lobby client.
pub struct Session {
    out: Responder,
    registry: Rc<CommandRegistry>,
    lobby: Rc<dyn LobbyService>,
}

impl Session {
    /// Build a session with the default command layers.
    pub fn new(lobby: Rc<dyn LobbyService>, shell: &ShellSection) -> Result<Self> {
        Self::with_layers(lobby, shell.default_port, DEFAULT_LAYERS)
    }

    /// Build a session from an explicit list of layers.
    pub fn with_layers(
        lobby: Rc<dyn LobbyService>,
        default_port: u16,
        layers: &[Layer],
    ) -> Result<Self> {
        let ctx = ShellContext::new(Rc::clone(&lobby), default_port);
        let mut registry = CommandRegistry::new();
        for layer in layers {
            layer(&mut registry, &ctx)?;
        }
        let registry = Rc::new(registry);
        ctx.registry.bind(&registry);
        log::debug!("session built with {} command(s)", registry.len());

        Ok(Self {
            out: ctx.out,
            registry,
            lobby,
        })
    }

    /// Greet a new connection.
    pub fn connection_made(&self) {
        self.out.announce(format!("Macco (version: {})", version_string()));
        self.out
            .send_line("Type 'help' for a list of available commands.");
    }

    /// Interpret one line of input.
    pub fn line_received(&self, line: &str) {
        if self.out.is_closed() {
            return;
        }
        match self.registry.handle_line(line) {
            Ok(Dispatch::Empty) => self.out.prompt(),
            Ok(Dispatch::Invoked) => {},
            Err(MaccoError::Usage { help, .. }) => {
                self.out.send_line(help.trim_end_matches('\n'));
            },
            Err(e) => {
                log::debug!("rejected line {line:?}: {e}");
                self.out.send_line(format!("Error: {e}"));
            },
        }
    }

    /// The connection is gone. Nothing is written after this.
    pub fn connection_lost(&self) {
        log::info!("session connection lost");
        self.out.mark_closed();
    }

    /// Complete outstanding lobby operations.
    pub fn poll(&self) -> usize {
        self.lobby.poll()
    }

    /// Take the output queued since the last call.
    pub fn drain_output(&self) -> Vec<Output> {
        self.out.drain()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn lobby(&self) -> &Rc<dyn LobbyService> {
        &self.lobby
    }

    pub fn is_closed(&self) -> bool {
        self.out.is_closed()
    }
}
