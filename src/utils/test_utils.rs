use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::completion::{CompletionBackend, RequestError};
use crate::core::controller::ConversationController;
use crate::core::credentials::{Credential, CredentialPool};
use crate::core::failover::{FailoverDispatcher, SkipPolicy};
use crate::core::message::Turn;
use crate::core::session::SessionStore;
use crate::core::storage::MemoryKeyValueStore;

/// Answers per credential secret. Secrets without a script fail with a
/// transport error. Every call is recorded in order.
#[derive(Default)]
pub struct ScriptedBackend {
    outcomes: HashMap<String, Result<String, RequestError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, secret: &str, content: &str) -> Self {
        self.outcomes
            .insert(secret.to_string(), Ok(content.to_string()));
        self
    }

    pub fn fail(mut self, secret: &str, error: RequestError) -> Self {
        self.outcomes.insert(secret.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _turns: &[Turn],
        credential: &Credential,
        _temperature: f32,
    ) -> Result<String, RequestError> {
        self.calls
            .lock()
            .unwrap()
            .push(credential.secret().to_string());
        self.outcomes
            .get(credential.secret())
            .cloned()
            .unwrap_or_else(|| {
                Err(RequestError::TransportFailure(
                    "connection refused".to_string(),
                ))
            })
    }
}

/// Succeeds with `content` only after [`GatedBackend::release`] is called.
pub struct GatedBackend {
    gate: Notify,
    content: String,
    received: Mutex<Vec<Vec<Turn>>>,
}

impl GatedBackend {
    pub fn new(content: &str) -> Self {
        Self {
            gate: Notify::new(),
            content: content.to_string(),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn received(&self) -> Vec<Vec<Turn>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for GatedBackend {
    async fn complete(
        &self,
        turns: &[Turn],
        _credential: &Credential,
        _temperature: f32,
    ) -> Result<String, RequestError> {
        self.received.lock().unwrap().push(turns.to_vec());
        self.gate.notified().await;
        Ok(self.content.clone())
    }
}

/// Pool of `size` credentials named `K0..K{size-1}` with no reservation.
pub fn test_pool(size: usize, last_good: usize) -> CredentialPool {
    CredentialPool::from_secrets((0..size).map(|i| format!("K{i}")))
        .unwrap()
        .with_last_good(last_good)
        .unwrap()
}

pub fn create_test_controller(
    backend: Arc<dyn CompletionBackend>,
    pool: CredentialPool,
    preferred: usize,
) -> (Arc<MemoryKeyValueStore>, ConversationController) {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let sessions = SessionStore::open(storage.clone()).unwrap();
    let dispatcher = FailoverDispatcher::new(backend, pool).with_policy(SkipPolicy::Preferred);
    let controller = ConversationController::new(dispatcher, sessions, preferred, 0.7).unwrap();
    (storage, controller)
}
