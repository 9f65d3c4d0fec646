//! Lobby commands: connecting, accounts, rosters and tables.
//!
//! Targets call into the session's [`LobbyService`](macco_lobby::LobbyService)
//! and report the outcome from the deferred's continuations, so a response
//! may arrive after later lines have already been dispatched.

use std::rc::Rc;

use macco_command::argument::{Argument, HOSTNAME, PASSWORD, PORT, TABLE_NAME, USERNAME};
use macco_command::{Command, CommandRegistry};
use macco_types::error::{MaccoError, Result};

use crate::context::ShellContext;
use crate::outbox::Responder;

/// Register the lobby commands, in help-listing order.
pub fn register_lobby_commands(reg: &mut CommandRegistry, ctx: &ShellContext) -> Result<()> {
    reg.register(connect(ctx)?)?;
    reg.register(disconnect(ctx)?)?;
    reg.register(register(ctx)?)?;
    reg.register(login(ctx)?)?;
    reg.register(users(ctx)?)?;
    reg.register(tables(ctx)?)?;
    reg.register(create_table(ctx)?)?;
    reg.register(join_table(ctx)?)?;
    reg.register(leave_table(ctx)?)?;
    Ok(())
}

/// Failure continuation shared by most commands.
fn report_error(out: &Responder) -> impl FnOnce(MaccoError) + 'static {
    let out = out.clone();
    move |err| out.send_line(format!("Error: {err}"))
}

/// Answer a target called without the arguments it needs.
fn usage(out: &Responder, name: &str, args: &[Argument]) {
    let shape: Vec<String> = args.iter().map(Argument::display).collect();
    out.send_line(format!("Error: usage: {name} {}", shape.join(" ")));
}

/// `connect <hostname> [port]`
pub fn connect(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let default_port = ctx.default_port;
    let cmd = Command::new(
        "connect",
        "Connect to the given server.",
        vec![HOSTNAME, PORT],
        move |args: &[&str]| {
            let [host, rest @ ..] = args else {
                usage(&out, "connect", &[HOSTNAME, PORT]);
                return;
            };
            let host = host.to_string();
            let port = match rest.first() {
                None => default_port,
                Some(raw) => match raw.parse::<u16>() {
                    Ok(p) => p,
                    Err(_) => {
                        out.send_line(format!("Error: invalid port: {raw}"));
                        return;
                    },
                },
            };

            out.announce(format!("Connecting to {host}."));
            let ok_out = out.clone();
            let err_out = out.clone();
            let ok_host = host.clone();
            lobby.connect(&host, port).then(
                move |()| ok_out.send_line(format!("Successfully connected to {ok_host}.")),
                move |err| {
                    log::debug!("connect to {host}:{port} failed: {err}");
                    err_out.send_line(format!("Failed to connect to {host}."));
                },
            );
        },
    )?;
    Ok(cmd.with_preconditions([Rc::clone(&ctx.checks.not_connected)]))
}

/// `disconnect`
pub fn disconnect(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new(
        "disconnect",
        "Disconnect from the current server.",
        vec![],
        move |_: &[&str]| {
            let host = lobby.host().unwrap_or_default();
            lobby.disconnect();
            out.send_line(format!("Disconnected from {host}"));
        },
    )?;
    Ok(cmd.with_preconditions([Rc::clone(&ctx.checks.connected)]))
}

/// `register <username> <password>`
pub fn register(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new(
        "register",
        "Register the given username/password.",
        vec![USERNAME, PASSWORD],
        move |args: &[&str]| {
            let [username, password, ..] = args else {
                usage(&out, "register", &[USERNAME, PASSWORD]);
                return;
            };
            let ok_out = out.clone();
            lobby.register(username, password).then(
                move |()| ok_out.send_line("Successfully registered."),
                report_error(&out),
            );
        },
    )?;
    Ok(cmd.with_preconditions([Rc::clone(&ctx.checks.connected)]))
}

/// `login <username> <password>`
pub fn login(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new(
        "login",
        "Log into the current server with the given username/password.",
        vec![USERNAME, PASSWORD],
        move |args: &[&str]| {
            let [username, password, ..] = args else {
                usage(&out, "login", &[USERNAME, PASSWORD]);
                return;
            };
            let ok_out = out.clone();
            lobby.login(username, password).then(
                move |_avatar| ok_out.send_line("Successfully logged in."),
                report_error(&out),
            );
        },
    )?;
    Ok(cmd.with_preconditions([
        Rc::clone(&ctx.checks.connected),
        Rc::clone(&ctx.checks.not_authenticated),
    ]))
}

/// `users`
pub fn users(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new("users", "List the logged-in users.", vec![], move |_: &[&str]| {
        out.send_line(lobby.users().join("\n"));
    })?;
    Ok(cmd.with_preconditions([
        Rc::clone(&ctx.checks.connected),
        Rc::clone(&ctx.checks.authenticated),
    ]))
}

/// `tables`
pub fn tables(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new("tables", "List the available tables.", vec![], move |_: &[&str]| {
        out.send_line(lobby.tables().join("\n"));
    })?;
    Ok(cmd.with_preconditions([
        Rc::clone(&ctx.checks.connected),
        Rc::clone(&ctx.checks.authenticated),
    ]))
}

/// `create-table <tablename>`
pub fn create_table(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new(
        "create-table",
        "Create a new table with the given name.",
        vec![TABLE_NAME],
        move |args: &[&str]| {
            let [name, ..] = args else {
                usage(&out, "create-table", &[TABLE_NAME]);
                return;
            };
            let name = name.to_string();
            let ok_out = out.clone();
            lobby.create_table(&name).then(
                move |()| ok_out.send_line(format!("Created table '{name}'.")),
                report_error(&out),
            );
        },
    )?;
    Ok(cmd.with_preconditions([
        Rc::clone(&ctx.checks.connected),
        Rc::clone(&ctx.checks.authenticated),
    ]))
}

/// `join-table <tablename>`
pub fn join_table(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new(
        "join-table",
        "Join the table with the given name.",
        vec![TABLE_NAME],
        move |args: &[&str]| {
            let [name, ..] = args else {
                usage(&out, "join-table", &[TABLE_NAME]);
                return;
            };
            let name = name.to_string();
            let ok_out = out.clone();
            lobby.join_table(&name).then(
                move |()| ok_out.send_line(format!("Joined '{name}'")),
                report_error(&out),
            );
        },
    )?;
    Ok(cmd.with_preconditions([
        Rc::clone(&ctx.checks.connected),
        Rc::clone(&ctx.checks.authenticated),
    ]))
}

/// `leave-table <tablename>`
pub fn leave_table(ctx: &ShellContext) -> Result<Command> {
    let out = ctx.out.clone();
    let lobby = Rc::clone(&ctx.lobby);
    let cmd = Command::new(
        "leave-table",
        "Leave the table with the given name.",
        vec![TABLE_NAME],
        move |args: &[&str]| {
            let [name, ..] = args else {
                usage(&out, "leave-table", &[TABLE_NAME]);
                return;
            };
            let name = name.to_string();
            let ok_out = out.clone();
            lobby.leave_table(&name).then(
                move |()| ok_out.send_line(format!("Left table '{name}'")),
                report_error(&out),
            );
        },
    )?;
    Ok(cmd.with_preconditions([
        Rc::clone(&ctx.checks.connected),
        Rc::clone(&ctx.checks.authenticated),
    ]))
}
