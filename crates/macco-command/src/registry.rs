//! Per-session command table and line dispatch.

use macco_types::error::{MaccoError, Result};

use crate::command::Command;

/// What happened to a line that dispatched without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The line had no tokens; the caller should re-prompt.
    Empty,
    /// A command target was invoked.
    Invoked,
}

/// Split a line on whitespace into a lower-cased command name and the
/// untouched arguments. `None` for a blank line.
pub fn tokenize(line: &str) -> Option<(String, Vec<&str>)> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?.to_lowercase();
    Some((name, parts.collect()))
}

/// Ordered collection of commands, unique by name.
///
/// Registration order is the order `help` lists commands in.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command. A name that is already registered is rejected.
    pub fn register(&mut self, cmd: Command) -> Result<()> {
        if self.find(cmd.name()).is_some() {
            return Err(MaccoError::DuplicateCommand(cmd.name().to_string()));
        }
        self.commands.push(cmd);
        Ok(())
    }

    /// Look up a command by its (lower-case) name.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name() == name)
    }

    /// All commands in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Names of the commands whose preconditions currently hold.
    pub fn usable_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|c| c.is_usable())
            .map(|c| c.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Tokenize and dispatch one input line.
    pub fn handle_line(&self, line: &str) -> Result<Dispatch> {
        match tokenize(line) {
            None => Ok(Dispatch::Empty),
            Some((name, args)) => {
                self.dispatch(&name, &args)?;
                Ok(Dispatch::Invoked)
            },
        }
    }

    /// Resolve `name` and invoke it with `args`.
    ///
    /// Checks run in a fixed order: existence, then usability, then minimum
    /// arity. An unusable command with too few arguments therefore reports
    /// `Unavailable`, never `Usage`. Extra arguments are passed through.
    pub fn dispatch(&self, name: &str, args: &[&str]) -> Result<()> {
        let cmd = self.find(name).ok_or_else(|| MaccoError::NoSuchCommand {
            name: name.to_string(),
        })?;

        if !cmd.is_usable() {
            return Err(MaccoError::Unavailable {
                name: name.to_string(),
            });
        }

        if args.len() < cmd.min_args() {
            return Err(MaccoError::Usage {
                name: name.to_string(),
                help: cmd.help(),
            });
        }

        log::debug!("dispatching '{name}' with {} argument(s)", args.len());
        cmd.execute(args);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::argument::{PASSWORD, USERNAME};
    use crate::command::Precondition;

    type Calls = Rc<RefCell<Vec<Vec<String>>>>;

    fn recording(name: &str, args: Vec<crate::Argument>, calls: &Calls) -> Command {
        let calls = Rc::clone(calls);
        Command::new(name, "test command", args, move |a: &[&str]| {
            calls
                .borrow_mut()
                .push(a.iter().map(|s| s.to_string()).collect());
        })
        .unwrap()
    }

    fn flag(value: bool) -> (Rc<Cell<bool>>, Precondition) {
        let cell = Rc::new(Cell::new(value));
        let c = Rc::clone(&cell);
        (cell, Rc::new(move || c.get()))
    }

    #[test]
    fn tokenize_lowercases_only_the_name() {
        let (name, args) = tokenize("  LOGIN Bob  PassWord ").unwrap();
        assert_eq!(name, "login");
        assert_eq!(args, vec!["Bob", "PassWord"]);
    }

    #[test]
    fn tokenize_blank_line() {
        assert!(tokenize("").is_none());
        assert!(tokenize("   \t ").is_none());
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let calls = Calls::default();
        let mut reg = CommandRegistry::new();
        reg.register(recording("users", vec![], &calls)).unwrap();
        let err = reg.register(recording("USERS", vec![], &calls)).unwrap_err();
        assert!(matches!(err, MaccoError::DuplicateCommand(ref n) if n == "users"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_command() {
        let reg = CommandRegistry::new();
        let err = reg.handle_line("frobnicate now").unwrap_err();
        assert!(matches!(err, MaccoError::NoSuchCommand { ref name } if name == "frobnicate"));
    }

    #[test]
    fn empty_line_invokes_nothing() {
        let calls = Calls::default();
        let mut reg = CommandRegistry::new();
        reg.register(recording("quit", vec![], &calls)).unwrap();
        assert_eq!(reg.handle_line("").unwrap(), Dispatch::Empty);
        assert_eq!(reg.handle_line("   ").unwrap(), Dispatch::Empty);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn unusable_beats_arity() {
        let calls = Calls::default();
        let (_connected, check) = flag(false);
        let mut reg = CommandRegistry::new();
        reg.register(recording("login", vec![USERNAME, PASSWORD], &calls).with_preconditions([check]))
            .unwrap();

        let err = reg.handle_line("login").unwrap_err();
        assert!(matches!(err, MaccoError::Unavailable { .. }));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn too_few_arguments_reports_help() {
        let calls = Calls::default();
        let (_connected, check) = flag(true);
        let mut reg = CommandRegistry::new();
        reg.register(recording("login", vec![USERNAME, PASSWORD], &calls).with_preconditions([check]))
            .unwrap();

        let err = reg.handle_line("login bob").unwrap_err();
        match err {
            MaccoError::Usage { name, help } => {
                assert_eq!(name, "login");
                assert_eq!(help, reg.find("login").unwrap().help());
            },
            other => panic!("expected usage error, got {other:?}"),
        }
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn invokes_with_extra_arguments() {
        let calls = Calls::default();
        let mut reg = CommandRegistry::new();
        reg.register(recording("login", vec![USERNAME, PASSWORD], &calls))
            .unwrap();

        assert_eq!(reg.handle_line("Login bob pw more").unwrap(), Dispatch::Invoked);
        assert_eq!(*calls.borrow(), vec![vec!["bob", "pw", "more"]]);
    }

    #[test]
    fn usability_tracks_state_changes() {
        let calls = Calls::default();
        let (connected, check) = flag(false);
        let mut reg = CommandRegistry::new();
        reg.register(recording("users", vec![], &calls).with_preconditions([check]))
            .unwrap();

        assert!(reg.handle_line("users").is_err());
        connected.set(true);
        assert!(reg.handle_line("users").is_ok());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn usable_names_in_registration_order() {
        let calls = Calls::default();
        let (_off, never) = flag(false);
        let mut reg = CommandRegistry::new();
        reg.register(recording("help", vec![], &calls)).unwrap();
        reg.register(recording("users", vec![], &calls).with_preconditions([never]))
            .unwrap();
        reg.register(recording("quit", vec![], &calls)).unwrap();
        assert_eq!(reg.usable_names(), vec!["help", "quit"]);
    }
}
