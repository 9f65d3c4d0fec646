//! Macco server entry point.
//!
//! Loads the configuration (first CLI argument, then `MACCO_CONFIG`, then
//! built-in defaults), builds the in-process lobby, and serves shell
//! sessions over TCP until the server stops.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use macco_lobby::Lobby;
use macco_net::StdNetworkBackend;
use macco_shell::ShellServer;
use macco_types::config::MaccoConfig;
use macco_types::version_string;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = MaccoConfig::resolve(std::env::args().nth(1).map(PathBuf::from))
        .context("loading configuration")?;
    log::info!(
        "Starting Macco {} on {}:{}",
        version_string(),
        config.listen.address,
        config.listen.port,
    );

    let lobby = Lobby::from_config(&config).context("building lobby servers")?;
    log::info!("{} lobby server(s) configured", lobby.server_count());

    let mut backend = StdNetworkBackend::new();
    let mut server = ShellServer::new(&config, lobby);
    server
        .start(&mut backend)
        .with_context(|| format!("binding {}:{}", config.listen.address, config.listen.port))?;

    let interval = Duration::from_millis(config.listen.poll_interval_ms);
    while server.tick(&mut backend) {
        thread::sleep(interval);
    }

    log::info!("Macco stopped");
    Ok(())
}
