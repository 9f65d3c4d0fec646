//! State shared by the command layers of one session.

use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use macco_command::{CommandRegistry, Precondition};
use macco_lobby::LobbyService;

use crate::outbox::Responder;

/// Late-bound reference to the session's own registry, for commands such
/// as `help` that inspect it. Bound once the registry is built.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    cell: Rc<OnceCell<Weak<CommandRegistry>>>,
}

impl RegistryHandle {
    /// Point the handle at the finished registry. Later calls are ignored.
    pub fn bind(&self, registry: &Rc<CommandRegistry>) {
        if self.cell.set(Rc::downgrade(registry)).is_err() {
            log::warn!("registry handle already bound");
        }
    }

    pub fn get(&self) -> Option<Rc<CommandRegistry>> {
        self.cell.get()?.upgrade()
    }
}

/// The session-state checks commands are gated on.
#[derive(Clone)]
pub struct Preconditions {
    pub connected: Precondition,
    pub not_connected: Precondition,
    pub authenticated: Precondition,
    pub not_authenticated: Precondition,
}

impl Preconditions {
    /// Checks reading the given lobby client's live state.
    pub fn for_lobby(lobby: &Rc<dyn LobbyService>) -> Self {
        let l = Rc::clone(lobby);
        let connected: Precondition = Rc::new(move || l.is_connected());
        let l = Rc::clone(lobby);
        let not_connected: Precondition = Rc::new(move || !l.is_connected());
        let l = Rc::clone(lobby);
        let authenticated: Precondition = Rc::new(move || l.is_authenticated());
        let l = Rc::clone(lobby);
        let not_authenticated: Precondition = Rc::new(move || !l.is_authenticated());
        Self {
            connected,
            not_connected,
            authenticated,
            not_authenticated,
        }
    }
}

/// Everything a command layer needs to build its commands.
#[derive(Clone)]
pub struct ShellContext {
    pub out: Responder,
    pub lobby: Rc<dyn LobbyService>,
    pub checks: Preconditions,
    pub registry: RegistryHandle,
    /// Lobby port used when `connect` is given none.
    pub default_port: u16,
}

impl ShellContext {
    pub fn new(lobby: Rc<dyn LobbyService>, default_port: u16) -> Self {
        Self {
            out: Responder::new(),
            checks: Preconditions::for_lobby(&lobby),
            lobby,
            registry: RegistryHandle::default(),
            default_port,
        }
    }
}
