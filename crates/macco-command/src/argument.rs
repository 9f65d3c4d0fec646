//! Positional command arguments and the shared argument definitions.

use std::borrow::Cow;

/// One positional parameter of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    optional: bool,
}

impl Argument {
    /// A required argument, usable in `const` items.
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            description: Cow::Borrowed(description),
            optional: false,
        }
    }

    /// An optional argument, usable in `const` items.
    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            description: Cow::Borrowed(description),
            optional: true,
        }
    }

    /// Build an argument from owned or borrowed text.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
        optional: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            optional,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// `[` for optional arguments, `<` for required ones.
    pub fn left_border(&self) -> char {
        if self.optional { '[' } else { '<' }
    }

    /// `]` for optional arguments, `>` for required ones.
    pub fn right_border(&self) -> char {
        if self.optional { ']' } else { '>' }
    }

    /// The argument as it appears in a usage line, e.g. `<username>`.
    pub fn display(&self) -> String {
        format!("{}{}{}", self.left_border(), self.name, self.right_border())
    }

    /// `name: description`.
    pub fn help(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

pub const USERNAME: Argument = Argument::required("username", "The user to login as.");
pub const PASSWORD: Argument = Argument::required("password", "The password for the given user.");
pub const COMMAND: Argument = Argument::optional("command", "The command to get help with.");
pub const HOSTNAME: Argument = Argument::required("hostname", "The server to connect to.");
pub const PORT: Argument = Argument::optional("port", "The port the server listens on.");
pub const TABLE_NAME: Argument = Argument::required("tablename", "The name of the table.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_borders() {
        assert_eq!(USERNAME.display(), "<username>");
        assert!(!USERNAME.is_optional());
    }

    #[test]
    fn optional_borders() {
        assert_eq!(COMMAND.display(), "[command]");
        assert!(COMMAND.is_optional());
    }

    #[test]
    fn help_is_name_colon_description() {
        assert_eq!(PASSWORD.help(), "password: The password for the given user.");
    }

    #[test]
    fn owned_argument() {
        let arg = Argument::new(String::from("seat"), String::from("Seat number."), true);
        assert_eq!(arg.name(), "seat");
        assert_eq!(arg.description(), "Seat number.");
        assert_eq!(arg.display(), "[seat]");
    }
}
