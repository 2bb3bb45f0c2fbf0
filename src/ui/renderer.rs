//! Frame drawing for the chat screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use tui_textarea::TextArea;

use crate::core::controller::Preferences;
use crate::core::message::Turn;
use crate::ui::history::HistoryPicker;
use crate::ui::markdown::render_markdown;
use crate::ui::theme::{ThemeColor, ThemeStyle};

const USER_PREFIX: &str = "You: ";
const INPUT_HEIGHT: u16 = 3;

/// Everything one frame needs, snapshotted from the controller.
pub struct Screen<'a> {
    pub session_id: &'a str,
    pub theme: ThemeColor,
    pub preferences: Preferences,
    pub credential_count: usize,
    pub turns: &'a [Turn],
    /// `Some(seconds)` while a reply is pending.
    pub thinking_seconds: Option<u64>,
    pub status: Option<&'a str>,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll_from_bottom: u16,
    pub history: Option<&'a HistoryPicker>,
}

pub fn build_title(screen: &Screen<'_>) -> String {
    let build = option_env!("VERGEN_GIT_SHA")
        .map(|sha| sha.chars().take(7).collect::<String>())
        .unwrap_or_default();
    let version = if build.is_empty() || build == "unknown" {
        format!("purrchat v{}", env!("CARGO_PKG_VERSION"))
    } else {
        format!("purrchat v{} ({build})", env!("CARGO_PKG_VERSION"))
    };
    format!(
        "{version} • {} • {} • credential #{}/{} • temp {:.1}",
        screen.session_id,
        screen.theme.style().display_name,
        screen.preferences.preferred_index + 1,
        screen.credential_count,
        screen.preferences.temperature,
    )
}

/// Label shown above an assistant turn.
pub fn assistant_label(turn: &Turn) -> String {
    match turn.credential_index {
        Some(0) => "error".to_string(),
        Some(label) => format!("credential #{label}"),
        None => "assistant".to_string(),
    }
}

pub fn build_transcript_lines(turns: &[Turn], theme: &ThemeStyle) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for turn in turns {
        if turn.is_user() {
            let mut content = turn.content.lines();
            let first = content.next().unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(USER_PREFIX, theme.user_prefix_style()),
                Span::styled(first.to_string(), theme.user_text_style()),
            ]));
            let indent = " ".repeat(USER_PREFIX.len());
            for rest in content {
                lines.push(Line::from(vec![
                    Span::raw(indent.clone()),
                    Span::styled(rest.to_string(), theme.user_text_style()),
                ]));
            }
        } else {
            let label_style = if turn.is_fallback_error() {
                theme.error_label_style()
            } else {
                theme.assistant_label_style()
            };
            lines.push(Line::from(Span::styled(assistant_label(turn), label_style)));
            lines.extend(render_markdown(&turn.content, theme));
        }
        lines.push(Line::default());
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

pub fn thinking_text(seconds: u64) -> String {
    format!("Thinking... ({seconds}s)")
}

pub fn ui(f: &mut Frame, screen: &Screen<'_>, input: &TextArea<'_>) {
    let theme = screen.theme.style();
    let status_height = u16::from(screen.thinking_seconds.is_some() || screen.status.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(status_height),
            Constraint::Length(INPUT_HEIGHT),
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(build_title(screen)).style(theme.title_style()),
        chunks[0],
    );

    let transcript = build_transcript_lines(screen.turns, theme);
    let total = wrapped_height(&transcript, chunks[1].width);
    let max_offset = total.saturating_sub(chunks[1].height);
    let offset = max_offset.saturating_sub(screen.scroll_from_bottom);
    f.render_widget(
        Paragraph::new(transcript)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0)),
        chunks[1],
    );

    if let Some(seconds) = screen.thinking_seconds {
        f.render_widget(
            Paragraph::new(thinking_text(seconds)).style(theme.thinking_style()),
            chunks[2],
        );
    } else if let Some(status) = screen.status {
        f.render_widget(
            Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM)),
            chunks[2],
        );
    }

    let input_title = if screen.thinking_seconds.is_some() {
        "Waiting for reply (Ctrl+C to quit)"
    } else {
        "Message (Enter send • Ctrl+N new • Ctrl+H history • Ctrl+P credential • Ctrl+T theme)"
    };
    let mut input = input.clone();
    input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(input_title),
    );
    f.render_widget(&input, chunks[3]);

    if let Some(picker) = screen.history {
        draw_history(f, picker, theme);
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_history(f: &mut Frame, picker: &HistoryPicker, theme: &ThemeStyle) {
    let area = centered(f.area(), 80, 70);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title("History (↑/↓ move • Enter open • Esc close)");

    if picker.is_empty() {
        f.render_widget(
            Paragraph::new("No saved sessions yet.").block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = picker
        .entries()
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}  ", entry.when),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::raw(entry.title.clone()),
                Span::styled(
                    format!("  ({} turns)", entry.turn_count),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::styled(
                    entry
                        .preview
                        .as_ref()
                        .map(|preview| format!("  · {preview}"))
                        .unwrap_or_default(),
                    Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::REVERSED),
        )
        .highlight_symbol("› ");
    let mut state = ListState::default().with_selected(Some(picker.selected()));
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Session;
    use ratatui::{backend::TestBackend, Terminal};

    fn preferences() -> Preferences {
        Preferences {
            preferred_index: 1,
            last_good_index: 1,
            temperature: 0.7,
        }
    }

    fn screen<'a>(turns: &'a [Turn], thinking: Option<u64>) -> Screen<'a> {
        Screen {
            session_id: "session-42",
            theme: ThemeColor::Yellow,
            preferences: preferences(),
            credential_count: 3,
            turns,
            thinking_seconds: thinking,
            status: None,
            scroll_from_bottom: 0,
            history: None,
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn labels_follow_credential_index() {
        assert_eq!(assistant_label(&Turn::assistant("hi", 2)), "credential #3");
        assert_eq!(assistant_label(&Turn::fallback_error()), "error");
    }

    #[test]
    fn title_shows_session_and_settings() {
        let turns = Vec::new();
        let title = build_title(&screen(&turns, None));
        assert!(title.contains("session-42"));
        assert!(title.contains("Warm Yellow"));
        assert!(title.contains("credential #2/3"));
        assert!(title.contains("temp 0.7"));
    }

    #[test]
    fn transcript_prefixes_user_and_labels_assistant() {
        let turns = vec![Turn::user("hello\nthere"), Turn::assistant("**purr**", 0)];
        let lines = build_transcript_lines(&turns, ThemeColor::Yellow.style());
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "You: hello");
        assert_eq!(text[1], "     there");
        assert_eq!(text[2], "");
        assert_eq!(text[3], "credential #1");
        assert_eq!(text[4], "purr");
    }

    #[test]
    fn wrapped_height_counts_wrapped_rows() {
        let lines = vec![Line::from("x".repeat(25)), Line::default()];
        assert_eq!(wrapped_height(&lines, 10), 4);
    }

    #[test]
    fn draws_thinking_indicator_while_sending() {
        let turns = vec![Turn::user("ping")];
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).expect("terminal");
        let input = TextArea::default();
        terminal
            .draw(|f| ui(f, &screen(&turns, Some(3)), &input))
            .expect("draw");
        let text = buffer_text(&terminal);
        assert!(text.contains("Thinking... (3s)"));
        assert!(text.contains("You: ping"));
    }

    #[test]
    fn draws_history_overlay() {
        let mut archived = Session::new("session-1");
        archived.turns.push(Turn::user("an old question"));
        let picker = HistoryPicker::new(&[archived]);
        let turns = Vec::new();
        let mut view = screen(&turns, None);
        view.history = Some(&picker);

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        let input = TextArea::default();
        terminal.draw(|f| ui(f, &view, &input)).expect("draw");
        assert!(buffer_text(&terminal).contains("an old question"));
    }
}
