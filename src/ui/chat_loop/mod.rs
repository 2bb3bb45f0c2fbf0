//! Full-screen chat loop.
//!
//! The loop polls crossterm, redraws on every tick so the thinking counter
//! advances, and spawns each send as its own task holding an
//! `Arc<ConversationController>`. Send results come back as status text over
//! a channel.

pub mod keybindings;
pub mod lifecycle;

use std::{error::Error, sync::Arc, time::Duration};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tui_textarea::TextArea;

use crate::core::controller::{ConversationController, IgnoreReason, SubmitOutcome};
use crate::ui::history::HistoryPicker;
use crate::ui::renderer::{ui, Screen};
use crate::ui::theme::ThemeColor;

use keybindings::KeyOutcome;
use lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Presentation state the controller does not own.
pub struct ChatView {
    pub input: TextArea<'static>,
    pub theme: ThemeColor,
    pub scroll_from_bottom: u16,
    pub history: Option<HistoryPicker>,
    pub status: Option<String>,
}

impl ChatView {
    pub fn new(theme: ThemeColor) -> Self {
        Self {
            input: TextArea::default(),
            theme,
            scroll_from_bottom: 0,
            history: None,
            status: None,
        }
    }

    pub fn set_status(&mut self, status: String) {
        self.status = Some(status);
    }

    pub fn clear_input(&mut self) {
        self.input = TextArea::default();
    }
}

/// Status line for a finished send.
pub fn describe_outcome(outcome: &SubmitOutcome) -> Option<String> {
    match outcome {
        SubmitOutcome::Replied { .. } => None,
        SubmitOutcome::Ignored(IgnoreReason::EmptyInput) => None,
        SubmitOutcome::Ignored(IgnoreReason::Busy) => {
            Some("Message not sent: a reply is still pending".to_string())
        }
        SubmitOutcome::Failed(failure) => Some(format!(
            "All {} credentials failed; see the log for details",
            failure.attempts.len()
        )),
    }
}

fn spawn_submit(
    controller: Arc<ConversationController>,
    text: String,
    status_tx: mpsc::UnboundedSender<String>,
) {
    tokio::spawn(async move {
        let status = match controller.submit(&text).await {
            Ok(outcome) => describe_outcome(&outcome),
            Err(err) => {
                warn!(%err, "reply received but the session could not be saved");
                Some(format!("Failed to save session: {err}"))
            }
        };
        if let Some(status) = status {
            let _ = status_tx.send(status);
        }
    });
}

fn draw(
    terminal: &mut ChatTerminal,
    view: &ChatView,
    controller: &ConversationController,
) -> Result<(), Box<dyn Error>> {
    let turns = controller.turns();
    let session_id = controller.session_id();
    let screen = Screen {
        session_id: &session_id,
        theme: view.theme,
        preferences: controller.preferences(),
        credential_count: controller.credential_count(),
        turns: &turns,
        thinking_seconds: controller
            .is_thinking()
            .then(|| controller.thinking_seconds()),
        status: view.status.as_deref(),
        scroll_from_bottom: view.scroll_from_bottom,
        history: view.history.as_ref(),
    };
    terminal.draw(|f| ui(f, &screen, &view.input))?;
    Ok(())
}

async fn event_loop(
    terminal: &mut ChatTerminal,
    view: &mut ChatView,
    controller: &Arc<ConversationController>,
) -> Result<(), Box<dyn Error>> {
    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();

    loop {
        while let Ok(status) = status_rx.try_recv() {
            view.set_status(status);
        }
        draw(terminal, view, controller)?;

        if !event::poll(POLL_INTERVAL)? {
            tokio::task::yield_now().await;
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match view.handle_key(key, controller) {
                    KeyOutcome::Continue => {}
                    KeyOutcome::Submit(text) => {
                        debug!(chars = text.len(), "submitting message");
                        spawn_submit(controller.clone(), text, status_tx.clone());
                    }
                    KeyOutcome::Quit => return Ok(()),
                }
            }
            Event::Paste(text) => {
                if view.history.is_none() {
                    view.input.insert_str(text);
                }
            }
            _ => {}
        }
    }
}

/// Runs the terminal UI until Ctrl+C. Returns the theme in use at exit so
/// the caller can persist it.
pub async fn run_chat(
    controller: Arc<ConversationController>,
    theme: ThemeColor,
) -> Result<ThemeColor, Box<dyn Error>> {
    let mut terminal = setup_terminal()?;
    let mut view = ChatView::new(theme);

    let result = event_loop(&mut terminal, &mut view, &controller).await;
    restore_terminal(&mut terminal)?;
    result.map(|()| view.theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::completion::RequestError;
    use crate::core::failover::{AllCredentialsFailed, FailedAttempt};

    #[test]
    fn outcome_status_lines() {
        assert_eq!(
            describe_outcome(&SubmitOutcome::Replied { used_index: 1 }),
            None
        );
        assert!(
            describe_outcome(&SubmitOutcome::Ignored(IgnoreReason::Busy))
                .is_some_and(|s| s.contains("still pending"))
        );
        let failure = AllCredentialsFailed {
            attempts: vec![FailedAttempt {
                index: 0,
                error: RequestError::TransportFailure("down".into()),
            }],
        };
        assert_eq!(
            describe_outcome(&SubmitOutcome::Failed(failure)).as_deref(),
            Some("All 1 credentials failed; see the log for details")
        );
    }

    #[test]
    fn new_view_starts_at_bottom_with_empty_input() {
        let view = ChatView::new(ThemeColor::Blue);
        assert_eq!(view.scroll_from_bottom, 0);
        assert!(view.history.is_none());
        assert_eq!(view.input.lines(), [""]);
    }
}
