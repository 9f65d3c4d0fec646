//! Error types for the Macco shell.

use std::io;

/// Errors produced by the Macco shell.
///
/// The user-facing variants render without the `Error: ` prefix; the session
/// adds it when writing them to the client.
#[derive(Debug, thiserror::Error)]
pub enum MaccoError {
    #[error("No such command.")]
    NoSuchCommand { name: String },

    #[error("Command not currently available.")]
    Unavailable { name: String },

    /// Too few arguments. Carries the command's full help text.
    #[error("{help}")]
    Usage { name: String, help: String },

    /// A lobby operation failed; the description is shown verbatim.
    #[error("{0}")]
    Collaborator(String),

    #[error("duplicate argument '{argument}' in command '{command}'")]
    DuplicateArgument { command: String, argument: String },

    #[error("duplicate command '{0}'")]
    DuplicateCommand(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl MaccoError {
    /// Whether this error is a construction-time defect rather than a
    /// per-line user error.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            MaccoError::DuplicateArgument { .. } | MaccoError::DuplicateCommand(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MaccoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_such_command_display() {
        let e = MaccoError::NoSuchCommand {
            name: "frobnicate".into(),
        };
        assert_eq!(format!("{e}"), "No such command.");
    }

    #[test]
    fn unavailable_display_hides_reason() {
        let e = MaccoError::Unavailable {
            name: "login".into(),
        };
        assert_eq!(format!("{e}"), "Command not currently available.");
    }

    #[test]
    fn usage_display_is_help_text() {
        let e = MaccoError::Usage {
            name: "quit".into(),
            help: "quit: Quit this session.\n".into(),
        };
        assert_eq!(format!("{e}"), "quit: Quit this session.\n");
    }

    #[test]
    fn collaborator_display_is_verbatim() {
        let e = MaccoError::Collaborator("bad credentials".into());
        assert_eq!(format!("Error: {e}"), "Error: bad credentials");
    }

    #[test]
    fn duplicate_argument_display() {
        let e = MaccoError::DuplicateArgument {
            command: "login".into(),
            argument: "username".into(),
        };
        assert_eq!(
            format!("{e}"),
            "duplicate argument 'username' in command 'login'"
        );
    }

    #[test]
    fn construction_errors_are_classified() {
        assert!(MaccoError::DuplicateCommand("help".into()).is_construction_error());
        assert!(
            MaccoError::DuplicateArgument {
                command: "a".into(),
                argument: "b".into(),
            }
            .is_construction_error()
        );
        assert!(!MaccoError::Collaborator("x".into()).is_construction_error());
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: MaccoError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: MaccoError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }
}
