//! Credential secrets kept in the platform keyring.
//!
//! Each credential slot is a keyring account under the `purrchat` service.
//! The pool is assembled once at startup, either from `PURRCHAT_API_KEYS` or
//! from the configured slots in order.

use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

use crate::core::constants::{API_KEYS_ENV, KEYRING_SERVICE};
use crate::core::credentials::{Credential, CredentialError, CredentialPool};

/// A keyring read or write that failed. `Unavailable` covers a locked or
/// unreachable backend, where retrying after unlocking can succeed.
#[derive(Debug)]
pub enum VaultError {
    Unavailable(keyring::Error),
    Failed(keyring::Error),
}

impl VaultError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, VaultError::Unavailable(_))
    }

    fn cause(&self) -> &keyring::Error {
        let (VaultError::Unavailable(err) | VaultError::Failed(err)) = self;
        err
    }
}

impl From<keyring::Error> for VaultError {
    fn from(err: keyring::Error) -> Self {
        if matches!(
            err,
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_)
        ) {
            VaultError::Unavailable(err)
        } else {
            VaultError::Failed(err)
        }
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.cause(), f)
    }
}

impl Error for VaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause())
    }
}

/// Why the credential pool could not be assembled at startup.
#[derive(Debug)]
pub enum CredentialLoadError {
    Keyring {
        slot: String,
        source: VaultError,
    },
    MissingSlot(String),
    Pool(CredentialError),
}

impl fmt::Display for CredentialLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialLoadError::Keyring { slot, source } => {
                let hint = if source.is_unavailable() {
                    " (the keyring may be locked; unlock it and retry)"
                } else {
                    ""
                };
                write!(f, "Failed to read credential slot '{slot}' from keyring: {source}{hint}")
            }
            CredentialLoadError::MissingSlot(slot) => write!(
                f,
                "Credential slot '{slot}' has no stored secret. Run 'purrchat auth {slot}'."
            ),
            CredentialLoadError::Pool(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CredentialLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialLoadError::Keyring { source, .. } => Some(source),
            CredentialLoadError::MissingSlot(_) => None,
            CredentialLoadError::Pool(err) => Some(err),
        }
    }
}

impl From<CredentialError> for CredentialLoadError {
    fn from(err: CredentialError) -> Self {
        CredentialLoadError::Pool(err)
    }
}

/// Read/write access to credential slots in the platform keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialVault;

impl CredentialVault {
    pub fn new() -> Self {
        Self
    }

    pub fn store(&self, slot: &str, secret: &str) -> Result<(), VaultError> {
        let entry = Entry::new(KEYRING_SERVICE, slot)?;
        entry.set_password(secret)?;
        debug!(slot, "stored credential in keyring");
        Ok(())
    }

    pub fn get(&self, slot: &str) -> Result<Option<String>, VaultError> {
        let entry = Entry::new(KEYRING_SERVICE, slot)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn remove(&self, slot: &str) -> Result<(), VaultError> {
        let entry = Entry::new(KEYRING_SERVICE, slot)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Splits a comma-separated secret list, dropping blanks.
pub fn parse_secret_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of credentials the pool would hold, without reading the keyring.
pub fn configured_pool_size(env_value: Option<&str>, slots: &[String]) -> usize {
    match env_value.map(parse_secret_list) {
        Some(secrets) if !secrets.is_empty() => secrets.len(),
        _ => slots.len(),
    }
}

/// Builds the ordered secret list. A non-empty environment list wins;
/// otherwise every slot is looked up in order and must be present.
pub fn resolve_secrets<F>(
    env_value: Option<&str>,
    slots: &[String],
    mut lookup: F,
) -> Result<Vec<String>, CredentialLoadError>
where
    F: FnMut(&str) -> Result<Option<String>, VaultError>,
{
    if let Some(secrets) = env_value
        .map(parse_secret_list)
        .filter(|list| !list.is_empty())
    {
        debug!(count = secrets.len(), "using credentials from {API_KEYS_ENV}");
        return Ok(secrets);
    }

    let mut secrets = Vec::with_capacity(slots.len());
    for slot in slots {
        match lookup(slot) {
            Ok(Some(secret)) => secrets.push(secret),
            Ok(None) => return Err(CredentialLoadError::MissingSlot(slot.clone())),
            Err(source) => {
                return Err(CredentialLoadError::Keyring {
                    slot: slot.clone(),
                    source,
                })
            }
        }
    }
    Ok(secrets)
}

/// Assembles the startup credential pool from the environment or keyring.
pub fn load_credential_pool(
    vault: &CredentialVault,
    slots: &[String],
) -> Result<CredentialPool, CredentialLoadError> {
    let env_value = std::env::var(API_KEYS_ENV).ok();
    let secrets = resolve_secrets(env_value.as_deref(), slots, |slot| vault.get(slot))?;
    Ok(CredentialPool::new(
        secrets.into_iter().map(Credential::new).collect(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn env_list_takes_precedence_over_slots() {
        let secrets = resolve_secrets(Some(" k0 , ,k1,"), &slots(&["a"]), |_| {
            panic!("keyring must not be consulted")
        })
        .expect("resolve");
        assert_eq!(secrets, vec!["k0", "k1"]);
    }

    #[test]
    fn blank_env_falls_back_to_slots_in_order() {
        let secrets = resolve_secrets(Some("  "), &slots(&["b", "a"]), |slot| {
            Ok(Some(format!("secret-{slot}")))
        })
        .expect("resolve");
        assert_eq!(secrets, vec!["secret-b", "secret-a"]);
    }

    #[test]
    fn missing_slot_is_reported_by_name() {
        let err = resolve_secrets(None, &slots(&["a", "b"]), |slot| {
            Ok((slot == "a").then(|| "x".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, CredentialLoadError::MissingSlot(ref s) if s == "b"));
        assert!(err.to_string().contains("purrchat auth b"));
    }

    #[test]
    fn locked_keyring_is_reported_as_unavailable() {
        let err = resolve_secrets(None, &slots(&["a"]), |_| {
            Err(VaultError::from(keyring::Error::NoStorageAccess(
                Box::new(std::io::Error::other("locked")),
            )))
        })
        .unwrap_err();
        match err {
            CredentialLoadError::Keyring { slot, source } => {
                assert_eq!(slot, "a");
                assert!(source.is_unavailable());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pool_size_counts_env_list_before_slots() {
        assert_eq!(configured_pool_size(Some("k0,k1,k2"), &slots(&["a"])), 3);
        assert_eq!(configured_pool_size(Some(" , "), &slots(&["a"])), 1);
        assert_eq!(configured_pool_size(None, &[]), 0);
    }

    #[test]
    fn no_slots_and_no_env_yields_empty_list() {
        let secrets = resolve_secrets(None, &[], |_| Ok(None)).expect("resolve");
        assert!(secrets.is_empty());
        assert!(matches!(
            CredentialPool::from_secrets(secrets),
            Err(CredentialError::NoCredentialsConfigured)
        ));
    }
}
