//! Command registry and dispatch engine.
//!
//! Commands declare positional [`Argument`]s and a list of preconditions over
//! session state. The [`CommandRegistry`] resolves a tokenized input line to a
//! command, gates it on existence, usability and minimum arity (in that
//! order), then invokes its target.

pub mod argument;
mod command;
mod registry;

pub use argument::Argument;
pub use command::{Command, Precondition, Target};
pub use registry::{CommandRegistry, Dispatch, tokenize};
