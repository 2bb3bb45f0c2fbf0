//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod auth;
pub mod bootstrap;
pub mod history;
pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::bootstrap::{build_controller, Paths};
use crate::cli::history::run_history;
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::constants::API_KEYS_ENV;
use crate::core::keyring::configured_pool_size;
use crate::ui::chat_loop::run_chat;
use crate::ui::theme::ThemeColor;
use crate::utils::logging::{init_tracing, LogTarget};

#[derive(Parser)]
#[command(name = "purrchat")]
#[command(version, about = "A full-screen terminal chat client with credential failover")]
#[command(
    long_about = "purrchat is a full-screen terminal chat client for OpenAI-compatible \
completion endpoints. Every send tries the preferred credential first and falls back \
through the rest of the pool. Sessions are saved locally after every reply.\n\n\
Credentials:\n\
  Use 'purrchat auth <slot>' to store a key in the system keyring.\n\
  PURRCHAT_API_KEYS (comma-separated) overrides the keyring when set.\n\n\
Environment Variables:\n\
  PURRCHAT_API_KEYS  Comma-separated credential list\n\
  PURRCHAT_LOG       Log filter (default: warn)\n\n\
Controls:\n\
  Enter             Send the message (Alt+Enter for a new line)\n\
  Ctrl+N            Start a new session\n\
  Ctrl+H            Browse saved sessions\n\
  Ctrl+P            Cycle the preferred credential\n\
  Ctrl+T            Cycle the theme\n\
  Ctrl+K / Ctrl+J   Raise / lower the temperature\n\
  PageUp/PageDown   Scroll the transcript\n\
  Ctrl+C            Save and quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding chat history and the log file
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Theme color: yellow, purple, red, orange or blue
    #[arg(long, global = true, value_name = "THEME")]
    pub theme: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the reply
    Say {
        /// The message to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List saved sessions, newest first
    History,
    /// Store an API key in the keyring under a named slot
    Auth {
        /// Keyring slot name
        slot: String,
    },
    /// Remove a stored API key and its slot
    Deauth {
        /// Keyring slot name
        slot: String,
    },
    /// Print the effective configuration
    Config,
}

fn resolve_theme(flag: Option<&str>, config: &Config) -> Result<ThemeColor, Box<dyn Error>> {
    match flag {
        Some(name) => ThemeColor::from_name(name).ok_or_else(|| {
            format!("Unknown theme '{name}'. Try yellow, purple, red, orange or blue.").into()
        }),
        None => Ok(config.theme_color()?),
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let paths = Paths::resolve(args.config.as_deref(), args.data_dir.as_deref())?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_tracing(LogTarget::FileIn(&paths.data_dir))?;
            let mut config = Config::load_from_path(&paths.config_path)?;
            let theme = resolve_theme(args.theme.as_deref(), &config)?;
            let controller = build_controller(&config, &paths)?;

            let theme = run_chat(controller.clone(), theme).await?;

            let prefs = controller.preferences();
            let saved = config.clone();
            config.theme = Some(theme.as_str().to_string());
            config.temperature = Some(prefs.temperature);
            config.preferred_credential = Some(prefs.preferred_index);
            if config != saved {
                config.save_to_path(&paths.config_path)?;
            }
            Ok(())
        }
        Commands::Say { prompt } => {
            init_tracing(LogTarget::Stderr)?;
            let config = Config::load_from_path(&paths.config_path)?;
            let theme = resolve_theme(args.theme.as_deref(), &config)?;
            run_say(prompt, &config, &paths, theme).await
        }
        Commands::History => {
            init_tracing(LogTarget::Stderr)?;
            run_history(&paths)
        }
        Commands::Auth { slot } => {
            init_tracing(LogTarget::Stderr)?;
            run_auth(&slot, &paths.config_path)
        }
        Commands::Deauth { slot } => {
            init_tracing(LogTarget::Stderr)?;
            run_deauth(&slot, &paths.config_path)
        }
        Commands::Config => {
            let config = Config::load_from_path(&paths.config_path)?;
            let env_value = std::env::var(API_KEYS_ENV).ok();
            let pool_size =
                configured_pool_size(env_value.as_deref(), &config.credential_slots);
            config.print_all(&paths.config_path, pool_size);
            Ok(())
        }
    }
}
