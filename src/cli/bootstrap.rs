//! Startup wiring: config, credentials, storage and the controller.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::core::completion::{CompletionBackend, HttpCompletionClient};
use crate::core::config::{Config, ConfigError};
use crate::core::controller::{ControllerError, ConversationController};
use crate::core::credentials::{CredentialError, CredentialPool};
use crate::core::failover::FailoverDispatcher;
use crate::core::keyring::{load_credential_pool, CredentialLoadError, CredentialVault};
use crate::core::session::SessionStore;
use crate::core::storage::{FileKeyValueStore, KeyValueStore, StoreError};

#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Credentials(CredentialLoadError),
    Preference {
        field: &'static str,
        source: CredentialError,
    },
    History(StoreError),
    HttpClient(reqwest::Error),
    Controller(ControllerError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(err) => write!(f, "{err}"),
            StartupError::Credentials(err) => write!(f, "{err}"),
            StartupError::Preference { field, source } => {
                write!(f, "Configured {field} cannot be used: {source}")
            }
            StartupError::History(err) => write!(f, "Failed to open chat history: {err}"),
            StartupError::HttpClient(err) => write!(f, "Failed to set up the HTTP client: {err}"),
            StartupError::Controller(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StartupError::Config(err) => Some(err),
            StartupError::Credentials(err) => Some(err),
            StartupError::Preference { source, .. } => Some(source),
            StartupError::History(err) => Some(err),
            StartupError::HttpClient(err) => Some(err),
            StartupError::Controller(err) => Some(err),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(err: ConfigError) -> Self {
        StartupError::Config(err)
    }
}

impl From<CredentialLoadError> for StartupError {
    fn from(err: CredentialLoadError) -> Self {
        StartupError::Credentials(err)
    }
}

impl From<StoreError> for StartupError {
    fn from(err: StoreError) -> Self {
        StartupError::History(err)
    }
}

impl From<ControllerError> for StartupError {
    fn from(err: ControllerError) -> Self {
        StartupError::Controller(err)
    }
}

/// Where the config file and the data directory live for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Paths {
    pub fn resolve(
        config_override: Option<&Path>,
        data_dir_override: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let config_path = match config_override {
            Some(path) => path.to_path_buf(),
            None => Config::default_config_path()?,
        };
        let data_dir = match data_dir_override {
            Some(dir) => dir.to_path_buf(),
            None => Config::default_data_dir()?,
        };
        Ok(Self {
            config_path,
            data_dir,
        })
    }

    pub fn history_store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(FileKeyValueStore::new(&self.data_dir))
    }
}

/// Builds the controller from config and already-resolved collaborators.
pub fn assemble_controller(
    config: &Config,
    pool: CredentialPool,
    backend: Arc<dyn CompletionBackend>,
    storage: Arc<dyn KeyValueStore>,
) -> Result<ConversationController, StartupError> {
    let size = pool.size();
    let last_good = config.last_good_credential(size);
    let preferred = config.preferred_credential(size);

    let pool = pool
        .with_last_good(last_good)
        .map_err(|source| StartupError::Preference {
            field: "last_good_credential",
            source,
        })?
        .with_reserved(config.reserved_credential());
    pool.check_selectable(preferred)
        .map_err(|source| StartupError::Preference {
            field: "preferred_credential",
            source,
        })?;

    let policy = config.failover_policy()?;
    let temperature = config.temperature()?;
    let sessions = SessionStore::open(storage)?;
    info!(
        credentials = size,
        preferred,
        last_good,
        policy = policy.as_str(),
        sessions = sessions.len(),
        "conversation pipeline ready"
    );

    let dispatcher = FailoverDispatcher::new(backend, pool).with_policy(policy);
    Ok(ConversationController::new(
        dispatcher,
        sessions,
        preferred,
        temperature,
    )?)
}

/// Resolves credentials from the environment or keyring and wires the HTTP
/// client and on-disk history into a controller.
pub fn build_controller(
    config: &Config,
    paths: &Paths,
) -> Result<Arc<ConversationController>, StartupError> {
    let pool = load_credential_pool(&CredentialVault::new(), &config.credential_slots)?;
    let backend = HttpCompletionClient::new(
        config.base_url(),
        config.model(),
        config.request_timeout(),
    )
    .map_err(StartupError::HttpClient)?;
    let controller =
        assemble_controller(config, pool, Arc::new(backend), paths.history_store())?;
    Ok(Arc::new(controller))
}
