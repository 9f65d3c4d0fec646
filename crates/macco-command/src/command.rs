//! A single command: arguments, preconditions, and the bound target.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use macco_types::error::{MaccoError, Result};

use crate::argument::Argument;

/// Zero-argument check of current session state.
///
/// Shared between commands, so stored behind `Rc`. Must not have side effects.
pub type Precondition = Rc<dyn Fn() -> bool>;

/// The work a command performs, given its positional arguments.
pub type Target = Box<dyn Fn(&[&str])>;

/// A named, described unit of work.
pub struct Command {
    name: String,
    description: String,
    arguments: Vec<Argument>,
    required: Vec<Argument>,
    optional: Vec<Argument>,
    preconditions: Vec<Precondition>,
    target: Target,
}

impl Command {
    /// Build a command, partitioning its arguments into required and
    /// optional sets. The name is stored lower-case.
    ///
    /// Fails if two arguments share a name.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: Vec<Argument>,
        target: F,
    ) -> Result<Self>
    where
        F: Fn(&[&str]) + 'static,
    {
        let name = name.into().to_lowercase();

        let mut seen = HashSet::new();
        for arg in &arguments {
            if !seen.insert(arg.name()) {
                return Err(MaccoError::DuplicateArgument {
                    command: name,
                    argument: arg.name().to_string(),
                });
            }
        }

        let (required, optional): (Vec<Argument>, Vec<Argument>) = arguments
            .iter()
            .cloned()
            .partition(|arg| !arg.is_optional());

        Ok(Self {
            name,
            description: description.into(),
            arguments,
            required,
            optional,
            preconditions: Vec::new(),
            target: Box::new(target),
        })
    }

    /// Append preconditions, evaluated in the given order.
    pub fn with_preconditions(mut self, preconditions: impl IntoIterator<Item = Precondition>) -> Self {
        self.preconditions.extend(preconditions);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// All arguments in declared order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn required_arguments(&self) -> &[Argument] {
        &self.required
    }

    pub fn optional_arguments(&self) -> &[Argument] {
        &self.optional
    }

    /// Minimum number of tokens after the command name.
    pub fn min_args(&self) -> usize {
        self.required.len()
    }

    /// Usage line followed by one tab-indented line per argument.
    ///
    /// ```text
    /// login <username> <password>: Log into the current server.
    /// 	username: The user to login as.
    /// 	password: The password for the given user.
    /// ```
    pub fn help(&self) -> String {
        let mut help = self.name.clone();
        for arg in &self.arguments {
            help.push(' ');
            help.push_str(&arg.display());
        }
        help.push_str(": ");
        help.push_str(&self.description);
        help.push('\n');

        for arg in &self.arguments {
            help.push('\t');
            help.push_str(&arg.help());
            help.push('\n');
        }
        help
    }

    /// Whether every precondition holds right now. Stops at the first failure.
    pub fn is_usable(&self) -> bool {
        self.preconditions.iter().all(|check| check())
    }

    /// Run the target with the arguments as given.
    pub fn execute(&self, args: &[&str]) {
        (self.target)(args);
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("preconditions", &self.preconditions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::argument::{COMMAND, PASSWORD, USERNAME};

    fn noop(_: &[&str]) {}

    #[test]
    fn partitions_arguments_in_order() {
        let opt = Argument::optional("seat", "Seat number.");
        let cmd = Command::new(
            "sit",
            "Sit down.",
            vec![USERNAME, opt.clone(), PASSWORD],
            noop,
        )
        .unwrap();
        assert_eq!(cmd.required_arguments(), &[USERNAME, PASSWORD]);
        assert_eq!(cmd.optional_arguments(), &[opt]);
        assert_eq!(cmd.min_args(), 2);
    }

    #[test]
    fn name_is_lowercased() {
        let cmd = Command::new("Create-Table", "x", vec![], noop).unwrap();
        assert_eq!(cmd.name(), "create-table");
    }

    #[test]
    fn duplicate_argument_rejected() {
        let err = Command::new("login", "x", vec![USERNAME, USERNAME], noop).unwrap_err();
        assert!(matches!(
            err,
            MaccoError::DuplicateArgument { ref command, ref argument }
                if command == "login" && argument == "username"
        ));
    }

    #[test]
    fn help_format() {
        let cmd = Command::new(
            "login",
            "Log into the current server.",
            vec![USERNAME, PASSWORD],
            noop,
        )
        .unwrap();
        assert_eq!(
            cmd.help(),
            "login <username> <password>: Log into the current server.\n\
             \tusername: The user to login as.\n\
             \tpassword: The password for the given user.\n"
        );
    }

    #[test]
    fn help_without_arguments() {
        let cmd = Command::new("quit", "Quit this session.", vec![], noop).unwrap();
        assert_eq!(cmd.help(), "quit: Quit this session.\n");
    }

    #[test]
    fn help_marks_optional_arguments() {
        let cmd = Command::new("help", "Show help.", vec![COMMAND], noop).unwrap();
        assert!(cmd.help().starts_with("help [command]: Show help.\n"));
    }

    #[test]
    fn usable_without_preconditions() {
        let cmd = Command::new("quit", "x", vec![], noop).unwrap();
        assert!(cmd.is_usable());
    }

    #[test]
    fn preconditions_are_evaluated_live() {
        let flag = Rc::new(Cell::new(false));
        let f = Rc::clone(&flag);
        let check: Precondition = Rc::new(move || f.get());
        let cmd = Command::new("users", "x", vec![], noop)
            .unwrap()
            .with_preconditions([check]);
        assert!(!cmd.is_usable());
        flag.set(true);
        assert!(cmd.is_usable());
    }

    #[test]
    fn usability_short_circuits() {
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let first: Precondition = Rc::new(|| false);
        let second: Precondition = Rc::new(move || {
            c.set(c.get() + 1);
            true
        });
        let cmd = Command::new("x", "x", vec![], noop)
            .unwrap()
            .with_preconditions([first, second]);
        assert!(!cmd.is_usable());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn execute_passes_arguments_unmodified() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let cmd = Command::new("login", "x", vec![USERNAME, PASSWORD], move |args: &[&str]| {
            s.borrow_mut()
                .extend(args.iter().map(|a| a.to_string()));
        })
        .unwrap();
        cmd.execute(&["Bob", "pW", "extra"]);
        assert_eq!(*seen.borrow(), vec!["Bob", "pW", "extra"]);
    }
}
