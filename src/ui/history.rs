//! Session history listing shared by the overlay and `purrchat history`.

use chrono::{Local, TimeZone};

use crate::core::session::Session;

const UNTITLED: &str = "(no user message)";
const TITLE_MAX_CHARS: usize = 60;
const PREVIEW_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    /// Last turn of the session, when it is not the title turn itself.
    pub preview: Option<String>,
    pub when: String,
    pub turn_count: usize,
}

impl HistoryEntry {
    pub fn from_session(session: &Session) -> Self {
        let title = truncate(session.title().unwrap_or(UNTITLED), TITLE_MAX_CHARS);
        let preview = (session.turns.len() > 1)
            .then(|| session.last_turn_preview())
            .flatten()
            .map(|line| truncate(line, PREVIEW_MAX_CHARS));
        Self {
            id: session.id.clone(),
            title,
            preview,
            when: format_timestamp(session.last_turn_time),
            turn_count: session.turns.len(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    } else {
        text.to_string()
    }
}

/// Local wall-clock time for a unix-millis timestamp.
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown time".to_string(),
    }
}

/// Overlay state: entries newest first and a cursor.
#[derive(Debug, Clone, Default)]
pub struct HistoryPicker {
    entries: Vec<HistoryEntry>,
    selected: usize,
}

impl HistoryPicker {
    /// `sessions` are expected newest first, as `list_sessions` returns them.
    pub fn new(sessions: &[Session]) -> Self {
        Self {
            entries: sessions.iter().map(HistoryEntry::from_session).collect(),
            selected: 0,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.entries.get(self.selected).map(|entry| entry.id.as_str())
    }
}
