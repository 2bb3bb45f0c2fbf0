use pulldown_cmark::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

type Cell = Vec<Span<'static>>;

/// Collects GFM table events and lays the cells out in a box-drawn grid.
pub(super) struct TableBuilder {
    alignments: Vec<Alignment>,
    rows: Vec<Vec<Cell>>,
    current_row: Vec<Cell>,
    current_cell: Cell,
    has_header: bool,
}

impl TableBuilder {
    pub(super) fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            rows: Vec::new(),
            current_row: Vec::new(),
            current_cell: Vec::new(),
            has_header: false,
        }
    }

    pub(super) fn end_header(&mut self) {
        self.has_header = true;
        self.end_row();
    }

    pub(super) fn end_row(&mut self) {
        if !self.current_row.is_empty() {
            self.rows.push(std::mem::take(&mut self.current_row));
        }
    }

    pub(super) fn start_cell(&mut self) {
        self.current_cell.clear();
    }

    pub(super) fn end_cell(&mut self) {
        self.current_row.push(std::mem::take(&mut self.current_cell));
    }

    pub(super) fn push_span(&mut self, span: Span<'static>) {
        self.current_cell.push(span);
    }

    pub(super) fn cell_spans(&self) -> &[Span<'static>] {
        &self.current_cell
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.alignments.len());
        let mut widths = vec![1; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell_width(cell));
            }
        }
        widths
    }

    pub(super) fn render(self, border: Style) -> Vec<Line<'static>> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths();
        let mut lines = vec![rule_line(&widths, ('┌', '┬', '┐'), border)];

        for (index, row) in self.rows.iter().enumerate() {
            let is_header = self.has_header && index == 0;
            lines.push(self.content_line(row, &widths, is_header, border));
            if is_header && self.rows.len() > 1 {
                lines.push(rule_line(&widths, ('├', '┼', '┤'), border));
            }
        }

        lines.push(rule_line(&widths, ('└', '┴', '┘'), border));
        lines
    }

    fn content_line(
        &self,
        row: &[Cell],
        widths: &[usize],
        is_header: bool,
        border: Style,
    ) -> Line<'static> {
        let mut spans = vec![Span::styled("│", border)];
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(Vec::as_slice).unwrap_or_default();
            let slack = width.saturating_sub(cell_width(cell));
            let (left, right) = match self.alignments.get(i) {
                Some(Alignment::Right) => (slack, 0),
                Some(Alignment::Center) => (slack / 2, slack - slack / 2),
                _ => (0, slack),
            };

            spans.push(Span::raw(" ".repeat(left + 1)));
            spans.extend(cell.iter().map(|span| {
                if is_header {
                    Span::styled(span.content.clone(), span.style.add_modifier(Modifier::BOLD))
                } else {
                    span.clone()
                }
            }));
            spans.push(Span::raw(" ".repeat(right + 1)));
            spans.push(Span::styled("│", border));
        }
        Line::from(spans)
    }
}

fn cell_width(cell: &[Span<'_>]) -> usize {
    cell.iter()
        .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
        .sum()
}

fn rule_line(
    widths: &[usize],
    (left, mid, right): (char, char, char),
    border: Style,
) -> Line<'static> {
    let inner = widths
        .iter()
        .map(|width| "─".repeat(width + 2))
        .collect::<Vec<_>>()
        .join(&mid.to_string());
    Line::from(Span::styled(format!("{left}{inner}{right}"), border))
}
