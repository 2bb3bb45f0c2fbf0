//! Conversation state machine: append, dispatch, record, persist.
//!
//! The controller is `Idle` or `Sending`. `submit` is the only way into
//! `Sending`, and it refuses while a send is already running, whatever the
//! caller does. Leaving `Sending` goes through [`SendGuard`]. The guard also
//! runs when the send future is dropped halfway, so the phase and the
//! thinking ticker are always torn down.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::core::credentials::CredentialError;
use crate::core::failover::{AllCredentialsFailed, FailoverDispatcher};
use crate::core::message::Turn;
use crate::core::session::{next_session_id, Session, SessionError, SessionStore};
use crate::core::ticker::ThinkingTicker;

const TEMPERATURE_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    pub preferred_index: usize,
    pub last_good_index: usize,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was appended and no state changed.
    Ignored(IgnoreReason),
    /// An assistant reply was appended.
    Replied { used_index: usize },
    /// Every credential failed; the fallback error turn was appended.
    Failed(AllCredentialsFailed),
}

#[derive(Debug)]
pub enum ControllerError {
    /// The operation is only legal while idle.
    Busy,
    Session(SessionError),
    Credential(CredentialError),
    InvalidTemperature(f32),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Busy => write!(f, "A reply is still pending; wait for it to finish"),
            ControllerError::Session(err) => write!(f, "{err}"),
            ControllerError::Credential(err) => write!(f, "{err}"),
            ControllerError::InvalidTemperature(value) => {
                write!(f, "Temperature {value} is outside [0, 1]")
            }
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ControllerError::Session(err) => Some(err),
            ControllerError::Credential(err) => Some(err),
            ControllerError::Busy | ControllerError::InvalidTemperature(_) => None,
        }
    }
}

impl From<SessionError> for ControllerError {
    fn from(err: SessionError) -> Self {
        ControllerError::Session(err)
    }
}

impl From<CredentialError> for ControllerError {
    fn from(err: CredentialError) -> Self {
        ControllerError::Credential(err)
    }
}

#[derive(Debug)]
struct ConversationState {
    phase: Phase,
    session: Session,
    preferred_index: usize,
    temperature: f32,
    ticker: Option<ThinkingTicker>,
}

pub struct ConversationController {
    dispatcher: FailoverDispatcher,
    sessions: SessionStore,
    state: Mutex<ConversationState>,
    thinking_seconds: Arc<AtomicU64>,
}

/// Returns the controller to `Idle` and stops the ticker when dropped.
struct SendGuard<'a> {
    controller: &'a ConversationController,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.controller.lock();
        state.phase = Phase::Idle;
        if let Some(ticker) = state.ticker.take() {
            ticker.stop();
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl ConversationController {
    /// Starts with a fresh, empty session.
    pub fn new(
        dispatcher: FailoverDispatcher,
        sessions: SessionStore,
        preferred_index: usize,
        temperature: f32,
    ) -> Result<Self, ControllerError> {
        dispatcher.pool().check_selectable(preferred_index)?;
        validate_temperature(temperature)?;
        let id = next_session_id(now_millis(), |candidate| sessions.contains(candidate));
        Ok(Self {
            dispatcher,
            sessions,
            state: Mutex::new(ConversationState {
                phase: Phase::Idle,
                session: Session::new(id),
                preferred_index,
                temperature,
                ticker: None,
            }),
            thinking_seconds: Arc::new(AtomicU64::new(0)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sends `text` as a user turn and records the outcome as an assistant
    /// turn. Blank input and concurrent submits are ignored without touching
    /// any state. The returned error only reports a failed save; the turns are
    /// appended in memory regardless.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, ControllerError> {
        let (history, preferred, temperature) = {
            let mut state = self.lock();
            if text.trim().is_empty() {
                return Ok(SubmitOutcome::Ignored(IgnoreReason::EmptyInput));
            }
            if state.phase == Phase::Sending {
                debug!("submit ignored: a send is already in flight");
                return Ok(SubmitOutcome::Ignored(IgnoreReason::Busy));
            }

            state.phase = Phase::Sending;
            state
                .session
                .turns
                .push(Turn::user(text).with_timestamp(now_millis()));
            state.ticker = Some(ThinkingTicker::start(self.thinking_seconds.clone()));
            (
                state.session.turns.clone(),
                state.preferred_index,
                state.temperature,
            )
        };
        let _guard = SendGuard { controller: self };

        let result = self
            .dispatcher
            .send(&history, preferred, temperature)
            .await;

        let (reply, outcome) = match result {
            Ok(dispatched) => (
                Turn::assistant(dispatched.content, dispatched.used_index),
                SubmitOutcome::Replied {
                    used_index: dispatched.used_index,
                },
            ),
            Err(failure) => {
                warn!(%failure, "send exhausted every credential");
                (Turn::fallback_error(), SubmitOutcome::Failed(failure))
            }
        };

        let snapshot = {
            let mut state = self.lock();
            let now = now_millis();
            state.session.turns.push(reply.with_timestamp(now));
            state.session.last_turn_time = now;
            state.session.clone()
        };
        self.sessions.save(&snapshot)?;
        Ok(outcome)
    }

    /// Persists the current session if it has turns, then starts an empty one
    /// with a new id.
    pub fn start_new_session(&self) -> Result<String, ControllerError> {
        let mut state = self.lock();
        if state.phase == Phase::Sending {
            return Err(ControllerError::Busy);
        }
        self.persist_if_non_empty(&mut state)?;

        // Never reuse an archived id.
        let id = next_session_id(now_millis(), |candidate| {
            candidate == state.session.id || self.sessions.contains(candidate)
        });
        debug!(%id, "starting new session");
        state.session = Session::new(id.clone());
        Ok(id)
    }

    /// Persists the current session, then makes `id` current. An unknown id
    /// leaves the current session in place.
    pub fn switch_session(&self, id: &str) -> Result<(), ControllerError> {
        let mut state = self.lock();
        if state.phase == Phase::Sending {
            return Err(ControllerError::Busy);
        }
        self.persist_if_non_empty(&mut state)?;

        let target = self.sessions.load(id)?;
        debug!(id, turns = target.turns.len(), "switched session");
        state.session = target;
        Ok(())
    }

    fn persist_if_non_empty(&self, state: &mut ConversationState) -> Result<(), SessionError> {
        if state.session.is_empty() {
            return Ok(());
        }
        // An unchanged session keeps its stored time.
        if self.sessions.load(&state.session.id).ok().as_ref() == Some(&state.session) {
            return Ok(());
        }
        state.session.last_turn_time = now_millis();
        self.sessions.save(&state.session)
    }

    pub fn set_preferred_index(&self, index: usize) -> Result<(), ControllerError> {
        self.dispatcher.pool().check_selectable(index)?;
        self.lock().preferred_index = index;
        Ok(())
    }

    /// Moves the preferred credential to the next selectable one.
    pub fn cycle_preferred(&self) -> usize {
        let mut state = self.lock();
        state.preferred_index = self.dispatcher.pool().next_selectable(state.preferred_index);
        state.preferred_index
    }

    pub fn set_temperature(&self, temperature: f32) -> Result<(), ControllerError> {
        validate_temperature(temperature)?;
        self.lock().temperature = temperature;
        Ok(())
    }

    /// Nudges the temperature by `steps` tenths, clamped to [0, 1].
    pub fn adjust_temperature(&self, steps: i32) -> f32 {
        let mut state = self.lock();
        let raw = state.temperature + steps as f32 * TEMPERATURE_STEP;
        state.temperature = ((raw * 10.0).round() / 10.0).clamp(0.0, 1.0);
        state.temperature
    }

    pub fn preferences(&self) -> Preferences {
        let state = self.lock();
        Preferences {
            preferred_index: state.preferred_index,
            last_good_index: self.dispatcher.pool().last_good(),
            temperature: state.temperature,
        }
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_thinking(&self) -> bool {
        self.lock()
            .ticker
            .as_ref()
            .is_some_and(ThinkingTicker::is_running)
    }

    pub fn thinking_seconds(&self) -> u64 {
        self.thinking_seconds.load(Ordering::SeqCst)
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.lock().session.turns.clone()
    }

    pub fn session_id(&self) -> String {
        self.lock().session.id.clone()
    }

    pub fn credential_count(&self) -> usize {
        self.dispatcher.pool().size()
    }

    pub fn list_sessions(&self) -> Vec<Session> {
        self.sessions.list_all()
    }

    /// Persists the current session on shutdown.
    pub fn flush(&self) -> Result<(), ControllerError> {
        let mut state = self.lock();
        self.persist_if_non_empty(&mut state)?;
        Ok(())
    }
}

fn validate_temperature(temperature: f32) -> Result<(), ControllerError> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(())
    } else {
        Err(ControllerError::InvalidTemperature(temperature))
    }
}
