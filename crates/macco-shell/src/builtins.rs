//! Built-in commands available in every session: `help` and `quit`.

use macco_command::argument::COMMAND;
use macco_command::{Command, CommandRegistry};
use macco_types::error::{MaccoError, Result};

use crate::context::ShellContext;

/// Register the built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry, ctx: &ShellContext) -> Result<()> {
    reg.register(help(ctx)?)?;
    reg.register(quit(ctx)?)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

/// Render `help` output against the session's registry.
///
/// Unlike top-level dispatch, a named command that exists but is unusable
/// reports unavailability rather than its help.
fn render_help(ctx: &ShellContext, args: &[&str]) -> String {
    let Some(registry) = ctx.registry.get() else {
        log::warn!("help invoked before the registry was bound");
        return "Valid commands:".to_string();
    };

    let Some(requested) = args.first() else {
        let names = registry.usable_names();
        return format!("Valid commands:\n\t{}", names.join("\n\t"));
    };

    let name = requested.to_lowercase();
    match registry.find(&name) {
        None => format!("Error: {}", MaccoError::NoSuchCommand { name }),
        Some(cmd) if !cmd.is_usable() => format!("Error: {}", MaccoError::Unavailable { name }),
        Some(cmd) => cmd.help().trim_end_matches('\n').to_string(),
    }
}

fn help(ctx: &ShellContext) -> Result<Command> {
    let ctx_help = ctx.clone();
    Command::new(
        "help",
        "List commands, or show help of the given command.",
        vec![COMMAND],
        move |args: &[&str]| {
            let text = render_help(&ctx_help, args);
            ctx_help.out.send_line(text);
        },
    )
}

// ---------------------------------------------------------------------------
// quit
// ---------------------------------------------------------------------------

fn quit(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    Command::new("quit", "Quit this session.", vec![], move |_: &[&str]| {
        out.announce("Quitting...");
        out.close();
    })
}
