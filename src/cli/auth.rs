//! `purrchat auth <slot>` / `purrchat deauth <slot>`.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::core::config::Config;
use crate::core::keyring::CredentialVault;

/// Reads one secret line; surrounding whitespace is dropped.
pub fn read_secret<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let secret = line.trim();
    Ok((!secret.is_empty()).then(|| secret.to_string()))
}

pub fn run_auth(slot: &str, config_path: &Path) -> Result<(), Box<dyn Error>> {
    print!("Enter the API key for slot '{slot}': ");
    io::stdout().flush()?;
    let Some(secret) = read_secret(&mut io::stdin().lock())? else {
        eprintln!("❌ No key entered; nothing stored");
        std::process::exit(1);
    };

    CredentialVault::new().store(slot, &secret)?;
    let mut config = Config::load_from_path(config_path)?;
    config.add_credential_slot(slot);
    config.save_to_path(config_path)?;

    let position = config
        .credential_slots
        .iter()
        .position(|s| s.eq_ignore_ascii_case(slot))
        .map_or(0, |i| i + 1);
    println!("✅ Stored credential slot '{slot}' as credential #{position}");
    Ok(())
}

pub fn run_deauth(slot: &str, config_path: &Path) -> Result<(), Box<dyn Error>> {
    CredentialVault::new().remove(slot)?;
    let mut config = Config::load_from_path(config_path)?;
    if config.remove_credential_slot(slot) {
        config.save_to_path(config_path)?;
        println!("✅ Removed credential slot '{slot}'");
    } else {
        println!("Credential slot '{slot}' was not configured; keyring entry cleared");
    }
    Ok(())
}
