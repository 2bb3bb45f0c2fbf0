//! Fixed, ordered pool of bearer credentials.
//!
//! The pool is built once at startup and never grows or shrinks. The only
//! mutable piece is the index of the last credential that rescued a failed
//! send, which the failover dispatcher records.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque bearer secret. `Debug` never prints the secret itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Configuration errors raised while building or indexing the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The pool would be empty.
    NoCredentialsConfigured,
    /// The index lies outside `[0, size)`.
    OutOfRange { index: usize, size: usize },
    /// The index names the emergency credential, which only failover may use.
    Reserved { index: usize },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::NoCredentialsConfigured => write!(
                f,
                "No credentials configured. Run 'purrchat auth <slot>' or set PURRCHAT_API_KEYS."
            ),
            CredentialError::OutOfRange { index, size } => write!(
                f,
                "Credential #{} does not exist (pool holds {} credential{})",
                index + 1,
                size,
                if *size == 1 { "" } else { "s" }
            ),
            CredentialError::Reserved { index } => write!(
                f,
                "Credential #{} is the emergency credential and is only used by failover",
                index + 1
            ),
        }
    }
}

impl Error for CredentialError {}

#[derive(Debug)]
pub struct CredentialPool {
    entries: Vec<Credential>,
    last_good: AtomicUsize,
    reserved: Option<usize>,
}

impl CredentialPool {
    pub fn new(entries: Vec<Credential>) -> Result<Self, CredentialError> {
        if entries.is_empty() {
            return Err(CredentialError::NoCredentialsConfigured);
        }
        Ok(Self {
            entries,
            last_good: AtomicUsize::new(0),
            reserved: None,
        })
    }

    pub fn from_secrets<I, S>(secrets: I) -> Result<Self, CredentialError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(secrets.into_iter().map(Credential::new).collect())
    }

    /// Seeds the recorded last-good index. Out-of-range seeds are rejected.
    pub fn with_last_good(self, index: usize) -> Result<Self, CredentialError> {
        self.check_range(index)?;
        self.last_good.store(index, Ordering::SeqCst);
        Ok(self)
    }

    /// Marks `index` as an emergency credential. A reserved index that falls
    /// outside the pool is ignored so small pools still work.
    pub fn with_reserved(mut self, index: Option<usize>) -> Self {
        self.reserved = index.filter(|i| *i < self.entries.len());
        self
    }

    pub fn get(&self, index: usize) -> Result<&Credential, CredentialError> {
        self.entries.get(index).ok_or(CredentialError::OutOfRange {
            index,
            size: self.entries.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn last_good(&self) -> usize {
        self.last_good.load(Ordering::SeqCst)
    }

    pub(crate) fn record_last_good(&self, index: usize) {
        self.last_good.store(index, Ordering::SeqCst);
    }

    /// Validates an index the user wants to send with first.
    pub fn check_selectable(&self, index: usize) -> Result<(), CredentialError> {
        self.check_range(index)?;
        if self.reserved == Some(index) && self.entries.len() > 1 {
            return Err(CredentialError::Reserved { index });
        }
        Ok(())
    }

    /// Next selectable index after `current`, wrapping around.
    pub fn next_selectable(&self, current: usize) -> usize {
        let size = self.entries.len();
        (1..=size)
            .map(|step| (current + step) % size)
            .find(|candidate| self.check_selectable(*candidate).is_ok())
            .unwrap_or(current)
    }

    fn check_range(&self, index: usize) -> Result<(), CredentialError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(CredentialError::OutOfRange {
                index,
                size: self.entries.len(),
            })
        }
    }
}
