//! Markdown to ratatui lines.
//!
//! [`render_markdown`] is a pure function of the turn content and the theme.
//! Math spans are kept verbatim (without their `$` delimiters) and styled;
//! fenced code blocks go through syntect. GFM tables are laid out as a
//! box-drawn grid.

mod table;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::ThemeStyle;
use crate::utils::syntax::highlight_code_block;

use table::TableBuilder;

const QUOTE_PREFIX: &str = "│ ";
const RULE_WIDTH: usize = 40;
const LIST_INDENT: usize = 2;

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct CodeBlock {
    lang: String,
    source: String,
}

struct Link {
    url: String,
    text_start: usize,
}

struct MarkdownRenderer<'a> {
    theme: &'a ThemeStyle,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    quote_depth: usize,
    code_block: Option<CodeBlock>,
    links: Vec<Link>,
    table: Option<TableBuilder>,
}

pub fn render_markdown(content: &str, theme: &ThemeStyle) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme).render(content)
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_TABLES);
    options
}

fn detab(text: &str) -> String {
    text.replace('\t', "    ")
}

impl<'a> MarkdownRenderer<'a> {
    fn new(theme: &'a ThemeStyle) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: Vec::new(),
            list_stack: Vec::new(),
            quote_depth: 0,
            code_block: None,
            links: Vec::new(),
            table: None,
        }
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        for event in Parser::new_ext(content, parser_options()) {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(text) => {
                    if let Some(block) = self.code_block.as_mut() {
                        block.source.push_str(&text);
                    } else {
                        self.push_text(&text, self.current_style());
                    }
                }
                Event::Code(code) => self.push_text(&code, self.theme.inline_code_style()),
                Event::InlineMath(math) => self.push_text(&math, self.theme.math_style()),
                Event::DisplayMath(math) => {
                    self.flush_line();
                    for line in math.trim().lines() {
                        self.push_text(line, self.theme.math_style());
                        self.flush_line();
                    }
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let trimmed = html.trim_end_matches('\n');
                    if !trimmed.is_empty() {
                        self.push_text(trimmed, self.current_style());
                    }
                    if html.ends_with('\n') {
                        self.flush_line();
                    }
                }
                Event::SoftBreak | Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.flush_line();
                    self.push_text(&"─".repeat(RULE_WIDTH), self.theme.border_style());
                    self.flush_line();
                    self.push_blank_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_text(marker, self.theme.user_prefix_style());
                }
                Event::FootnoteReference(_) => {}
            }
        }

        self.flush_line();
        while self
            .lines
            .last()
            .is_some_and(|line| line.spans.iter().all(|s| s.content.is_empty()))
        {
            self.lines.pop();
        }
        self.lines
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let style = self.theme.heading_style(level as u8);
                self.style_stack.push(style);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
                self.style_stack.push(self.theme.quote_style());
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let depth = self.list_stack.len().saturating_sub(1);
                self.begin_line();
                if depth > 0 {
                    self.current
                        .push(Span::raw(" ".repeat(depth * LIST_INDENT)));
                }
                self.current
                    .push(Span::styled(marker, self.theme.user_prefix_style()));
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some(CodeBlock {
                    lang,
                    source: String::new(),
                });
            }
            Tag::Table(alignments) => {
                self.flush_line();
                self.table = Some(TableBuilder::new(alignments));
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.start_cell();
                }
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.style_stack.push(self.theme.link_style());
                let text_start = self.active_spans().len();
                self.links.push(Link {
                    url: dest_url.to_string(),
                    text_start,
                });
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.push_blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.push_blank_line();
                self.style_stack.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.style_stack.pop();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.push_blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.end_header();
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.end_row();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                }
            }
            TagEnd::Table => self.finish_table(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.style_stack.pop();
                if let Some(link) = self.links.pop() {
                    self.append_link_target(link);
                }
            }
            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    /// Starts a fresh line with the quote gutter and list continuation indent.
    fn begin_line(&mut self) {
        if !self.current.is_empty() {
            return;
        }
        if self.quote_depth > 0 {
            self.current.push(Span::styled(
                QUOTE_PREFIX.repeat(self.quote_depth),
                self.theme.border_style(),
            ));
        }
    }

    /// Spans of the line or table cell currently being built.
    fn active_spans(&self) -> &[Span<'static>] {
        match &self.table {
            Some(table) => table.cell_spans(),
            None => &self.current,
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if let Some(table) = self.table.as_mut() {
            table.push_span(Span::styled(detab(text), style));
            return;
        }
        if self.current.is_empty() {
            self.begin_line();
            if !self.list_stack.is_empty() {
                self.current
                    .push(Span::raw(" ".repeat(self.list_stack.len() * LIST_INDENT)));
            }
        }
        self.current.push(Span::styled(detab(text), style));
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn push_blank_line(&mut self) {
        if self
            .lines
            .last()
            .is_some_and(|line| !line.spans.is_empty())
        {
            self.lines.push(Line::default());
        }
    }

    fn append_link_target(&mut self, link: Link) {
        let text: String = self
            .active_spans()
            .get(link.text_start..)
            .unwrap_or_default()
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        if link.url.is_empty() || text.trim() == link.url {
            return;
        }
        self.push_text(
            &format!(" ({})", link.url),
            Style::default().add_modifier(Modifier::DIM),
        );
    }

    fn finish_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        for line in table.render(self.theme.border_style()) {
            self.begin_line();
            self.current.extend(line.spans);
            self.flush_line();
        }
        self.push_blank_line();
    }

    fn finish_code_block(&mut self) {
        let Some(block) = self.code_block.take() else {
            return;
        };
        let source = block.source.trim_end_matches('\n');
        let highlighted = highlight_code_block(&block.lang, source).unwrap_or_else(|| {
            source
                .lines()
                .map(|line| {
                    Line::from(Span::styled(
                        line.to_string(),
                        self.theme.code_block_fallback_style(),
                    ))
                })
                .collect()
        });

        for line in highlighted {
            self.begin_line();
            if !self.list_stack.is_empty() {
                self.current
                    .push(Span::raw(" ".repeat(self.list_stack.len() * LIST_INDENT)));
            }
            self.current.push(Span::raw("  "));
            self.current.extend(
                line.spans
                    .into_iter()
                    .map(|span| Span::styled(detab(&span.content), span.style)),
            );
            self.flush_line();
        }
        self.push_blank_line();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeColor;

    fn render(content: &str) -> Vec<Line<'static>> {
        render_markdown(content, ThemeColor::Yellow.style())
    }

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(text_of).collect()
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        let lines = render("first\n\nsecond");
        assert_eq!(texts(&lines), vec!["first", "", "second"]);
    }

    #[test]
    fn heading_uses_theme_heading_style() {
        let theme = ThemeColor::Purple.style();
        let lines = render_markdown("# Title\n\nbody", theme);
        assert_eq!(text_of(&lines[0]), "Title");
        assert_eq!(lines[0].spans[0].style, theme.heading_style(1));
    }

    #[test]
    fn emphasis_and_strong_stack_modifiers() {
        let lines = render("***both***");
        let span = &lines[0].spans[0];
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn strikethrough_is_crossed_out() {
        let lines = render("~~gone~~");
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::CROSSED_OUT));
    }

    #[test]
    fn math_is_kept_verbatim_and_styled() {
        let theme = ThemeColor::Yellow.style();
        let lines = render_markdown("energy $E = mc^2$ here", theme);
        let math = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "E = mc^2")
            .expect("math span");
        assert_eq!(math.style, theme.math_style());
    }

    #[test]
    fn display_math_gets_its_own_line() {
        let lines = render("before\n\n$$\\int_0^1 x\\,dx$$\n\nafter");
        assert!(texts(&lines).contains(&"\\int_0^1 x\\,dx".to_string()));
    }

    #[test]
    fn inline_code_uses_code_style() {
        let theme = ThemeColor::Blue.style();
        let lines = render_markdown("run `cargo` now", theme);
        let code = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "cargo")
            .expect("code span");
        assert_eq!(code.style, theme.inline_code_style());
    }

    #[test]
    fn lists_get_markers_and_nesting_indent() {
        let lines = render("- one\n- two\n  - nested\n\n1. first\n2. second");
        let rendered = texts(&lines);
        assert_eq!(rendered[0], "• one");
        assert_eq!(rendered[1], "• two");
        assert_eq!(rendered[2], "  • nested");
        assert!(rendered.contains(&"1. first".to_string()));
        assert!(rendered.contains(&"2. second".to_string()));
    }

    #[test]
    fn block_quote_lines_carry_gutter() {
        let lines = render("> quoted\n> more");
        let rendered = texts(&lines);
        assert_eq!(rendered[0], "│ quoted");
        assert_eq!(rendered[1], "│ more");
    }

    #[test]
    fn fenced_code_is_highlighted_and_indented() {
        let lines = render("```rust\nlet x = 1;\nlet y = 2;\n```\nafter");
        let rendered = texts(&lines);
        assert_eq!(rendered[0], "  let x = 1;");
        assert_eq!(rendered[1], "  let y = 2;");
        assert_eq!(rendered[2], "");
        assert_eq!(rendered[3], "after");
        assert!(lines[0].spans.len() > 2, "expected highlighted spans");
    }

    #[test]
    fn link_target_is_shown_once() {
        let lines = render("see [docs](https://example.com) and <https://example.org>");
        let rendered = text_of(&lines[0]);
        assert!(rendered.contains("docs (https://example.com)"));
        assert_eq!(rendered.matches("https://example.org").count(), 1);
    }

    #[test]
    fn rule_and_trailing_blank_lines() {
        let lines = render("above\n\n---\n\nbelow\n\n");
        let rendered = texts(&lines);
        assert!(rendered.iter().any(|l| l.starts_with('─')));
        assert_eq!(rendered.last().map(String::as_str), Some("below"));
    }

    #[test]
    fn tables_are_drawn_as_a_grid() {
        let lines = render("| a | b |\n|---|---|\n| 1 | 2 |\n\nafter");
        assert_eq!(
            texts(&lines),
            vec![
                "┌───┬───┐",
                "│ a │ b │",
                "├───┼───┤",
                "│ 1 │ 2 │",
                "└───┴───┘",
                "",
                "after",
            ]
        );
    }

    #[test]
    fn table_columns_follow_widest_cell_and_alignment() {
        let lines =
            render("| name | n |\n|:---|---:|\n| x | 10 |\n| `ls` | [d](https://d.io) |");
        let rendered = texts(&lines);
        assert_eq!(rendered[1], "│ name │                n │");
        assert_eq!(rendered[3], "│ x    │               10 │");
        assert_eq!(rendered[4], "│ ls   │ d (https://d.io) │");
        let header = lines[1]
            .spans
            .iter()
            .find(|s| s.content == "name")
            .expect("header span");
        assert!(header.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn plain_text_without_markup_is_unchanged() {
        let lines = render("Meow... something went wrong, please try again later.");
        assert_eq!(
            texts(&lines),
            vec!["Meow... something went wrong, please try again later."]
        );
    }
}
