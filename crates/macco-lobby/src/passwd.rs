//! `username:password` account files.

use std::path::Path;

use macco_types::error::{MaccoError, Result};

const DELIMITER: char = ':';

/// Parse an account file. Blank lines and `#` comments are skipped, as are
/// lines without a delimiter or with an empty username.
pub fn parse_password_db(text: &str) -> Vec<(String, String)> {
    let mut accounts = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once(DELIMITER) {
            Some((user, password)) if !user.is_empty() => {
                accounts.push((user.to_string(), password.to_string()));
            },
            _ => log::warn!("password db line {}: malformed entry skipped", lineno + 1),
        }
    }
    accounts
}

/// Read and parse an account file.
pub fn load_password_db(path: &Path) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MaccoError::Config(format!("password db {}: {e}", path.display())))?;
    let accounts = parse_password_db(&text);
    log::info!("loaded {} account(s) from {}", accounts.len(), path.display());
    Ok(accounts)
}
