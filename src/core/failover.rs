//! Sequential credential failover.
//!
//! A send first tries the preferred credential. If that fails, the dispatcher
//! walks the pool in ascending order and stops at the first success. Attempts
//! never run in parallel, so a send is billed at most once and the last-good
//! bookkeeping never races.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::completion::{CompletionBackend, RequestError};
use crate::core::credentials::CredentialPool;
use crate::core::message::Turn;

/// Which index the fallback walk leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Skip the preferred credential, which just failed. Every credential is
    /// tried exactly once per send.
    #[default]
    Preferred,
    /// Skip the recorded last-good credential. When the
    /// preferred and last-good indices differ, the preferred credential is
    /// retried and the last-good one is never attempted.
    LastGood,
}

impl SkipPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "preferred" => Some(SkipPolicy::Preferred),
            "last-good" | "last_good" | "lastgood" => Some(SkipPolicy::LastGood),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkipPolicy::Preferred => "preferred",
            SkipPolicy::LastGood => "last-good",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub content: String,
    pub used_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub index: usize,
    pub error: RequestError,
}

/// Every attempt of a send failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllCredentialsFailed {
    pub attempts: Vec<FailedAttempt>,
}

impl fmt::Display for AllCredentialsFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all credentials failed after {} attempt(s)", self.attempts.len())?;
        if let Some(last) = self.attempts.last() {
            write!(f, "; last error from credential #{}: {}", last.index + 1, last.error)?;
        }
        Ok(())
    }
}

impl Error for AllCredentialsFailed {}

pub struct FailoverDispatcher {
    backend: Arc<dyn CompletionBackend>,
    pool: CredentialPool,
    policy: SkipPolicy,
}

impl FailoverDispatcher {
    pub fn new(backend: Arc<dyn CompletionBackend>, pool: CredentialPool) -> Self {
        Self {
            backend,
            pool,
            policy: SkipPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SkipPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn policy(&self) -> SkipPolicy {
        self.policy
    }

    pub async fn send(
        &self,
        turns: &[Turn],
        preferred: usize,
        temperature: f32,
    ) -> Result<Dispatched, AllCredentialsFailed> {
        let mut attempts = Vec::new();

        match self.attempt(turns, preferred, temperature).await {
            Ok(content) => {
                debug!(index = preferred, "preferred credential succeeded");
                return Ok(Dispatched {
                    content,
                    used_index: preferred,
                });
            }
            Err(error) => {
                warn!(index = preferred, %error, "preferred credential failed; starting failover");
                attempts.push(FailedAttempt {
                    index: preferred,
                    error,
                });
            }
        }

        let skip = match self.policy {
            SkipPolicy::Preferred => preferred,
            SkipPolicy::LastGood => self.pool.last_good(),
        };

        for candidate in (0..self.pool.size()).filter(|i| *i != skip) {
            match self.attempt(turns, candidate, temperature).await {
                Ok(content) => {
                    self.pool.record_last_good(candidate);
                    info!(index = candidate, "failover credential succeeded");
                    return Ok(Dispatched {
                        content,
                        used_index: candidate,
                    });
                }
                Err(error) => {
                    warn!(index = candidate, %error, "failover credential failed");
                    attempts.push(FailedAttempt {
                        index: candidate,
                        error,
                    });
                }
            }
        }

        Err(AllCredentialsFailed { attempts })
    }

    async fn attempt(
        &self,
        turns: &[Turn],
        index: usize,
        temperature: f32,
    ) -> Result<String, RequestError> {
        let credential = self
            .pool
            .get(index)
            .map_err(|err| RequestError::TransportFailure(err.to_string()))?;
        self.backend.complete(turns, credential, temperature).await
    }
}
