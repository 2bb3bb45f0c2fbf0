//! Key handling for the chat screen.
//!
//! Handlers only touch the controller through its synchronous settings and
//! session operations. Sending is returned as [`KeyOutcome::Submit`] so the
//! event loop can spawn it.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::core::controller::{ConversationController, Phase};
use crate::ui::history::HistoryPicker;

use super::ChatView;

const PAGE_SCROLL: u16 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Submit(String),
    Quit,
}

fn ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

impl ChatView {
    pub fn handle_key(&mut self, key: KeyEvent, controller: &ConversationController) -> KeyOutcome {
        if ctrl(&key, 'c') {
            if let Err(err) = controller.flush() {
                warn!(%err, "failed to persist session on quit");
            }
            return KeyOutcome::Quit;
        }

        if self.history.is_some() {
            self.handle_history_key(key, controller);
            return KeyOutcome::Continue;
        }

        if ctrl(&key, 'n') {
            match controller.start_new_session() {
                Ok(id) => {
                    self.scroll_from_bottom = 0;
                    self.set_status(format!("Started {id}"));
                }
                Err(err) => self.set_status(err.to_string()),
            }
        } else if ctrl(&key, 'h') {
            self.history = Some(HistoryPicker::new(&controller.list_sessions()));
        } else if ctrl(&key, 'p') {
            let index = controller.cycle_preferred();
            self.set_status(format!("Preferred credential #{}", index + 1));
        } else if ctrl(&key, 't') {
            self.theme = self.theme.next();
            self.set_status(format!("Theme: {}", self.theme.style().display_name));
        } else if ctrl(&key, 'k') {
            let value = controller.adjust_temperature(1);
            self.set_status(format!("Temperature {value:.1}"));
        } else if ctrl(&key, 'j') {
            let value = controller.adjust_temperature(-1);
            self.set_status(format!("Temperature {value:.1}"));
        } else {
            match key.code {
                KeyCode::PageUp => {
                    self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(PAGE_SCROLL);
                }
                KeyCode::PageDown => {
                    self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(PAGE_SCROLL);
                }
                KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                    self.input.insert_newline();
                }
                KeyCode::Enter => return self.take_submission(controller),
                _ => {
                    self.input.input(key);
                }
            }
        }
        KeyOutcome::Continue
    }

    fn take_submission(&mut self, controller: &ConversationController) -> KeyOutcome {
        let text = self.input.lines().join("\n");
        if text.trim().is_empty() {
            return KeyOutcome::Continue;
        }
        if controller.phase() == Phase::Sending {
            self.set_status("A reply is still pending".to_string());
            return KeyOutcome::Continue;
        }
        self.clear_input();
        self.scroll_from_bottom = 0;
        self.status = None;
        KeyOutcome::Submit(text)
    }

    fn handle_history_key(&mut self, key: KeyEvent, controller: &ConversationController) {
        let Some(picker) = self.history.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Up => picker.move_up(),
            KeyCode::Down => picker.move_down(),
            KeyCode::Esc => self.history = None,
            KeyCode::Enter => {
                let Some(id) = picker.selected_id().map(str::to_string) else {
                    self.history = None;
                    return;
                };
                match controller.switch_session(&id) {
                    Ok(()) => {
                        self.history = None;
                        self.scroll_from_bottom = 0;
                        self.set_status(format!("Opened {id}"));
                    }
                    Err(err) => self.set_status(err.to_string()),
                }
            }
            _ => {}
        }
    }
}
