//! Theme colors and their fixed style records.
//!
//! A theme is a plain lookup from [`ThemeColor`] to a static [`ThemeStyle`];
//! nothing outside the presentation layer reads it.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeColor {
    #[default]
    Yellow,
    Purple,
    Red,
    Orange,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeStyle {
    pub display_name: &'static str,
    /// Primary accent (borders, prefixes, headings).
    pub accent: Color,
    /// Second gradient stop, used for highlights.
    pub highlight: Color,
}

const YELLOW: ThemeStyle = ThemeStyle {
    display_name: "Warm Yellow",
    accent: Color::Rgb(245, 158, 11),
    highlight: Color::Rgb(250, 204, 21),
};

const PURPLE: ThemeStyle = ThemeStyle {
    display_name: "Elegant Purple",
    accent: Color::Rgb(168, 85, 247),
    highlight: Color::Rgb(236, 72, 153),
};

const RED: ThemeStyle = ThemeStyle {
    display_name: "Passion Red",
    accent: Color::Rgb(239, 68, 68),
    highlight: Color::Rgb(251, 113, 133),
};

const ORANGE: ThemeStyle = ThemeStyle {
    display_name: "Vibrant Orange",
    accent: Color::Rgb(249, 115, 22),
    highlight: Color::Rgb(251, 191, 36),
};

const BLUE: ThemeStyle = ThemeStyle {
    display_name: "Calm Blue",
    accent: Color::Rgb(59, 130, 246),
    highlight: Color::Rgb(34, 211, 238),
};

impl ThemeColor {
    pub const ALL: [ThemeColor; 5] = [
        ThemeColor::Yellow,
        ThemeColor::Purple,
        ThemeColor::Red,
        ThemeColor::Orange,
        ThemeColor::Blue,
    ];

    pub fn style(self) -> &'static ThemeStyle {
        match self {
            ThemeColor::Yellow => &YELLOW,
            ThemeColor::Purple => &PURPLE,
            ThemeColor::Red => &RED,
            ThemeColor::Orange => &ORANGE,
            ThemeColor::Blue => &BLUE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeColor::Yellow => "yellow",
            ThemeColor::Purple => "purple",
            ThemeColor::Red => "red",
            ThemeColor::Orange => "orange",
            ThemeColor::Blue => "blue",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn next(self) -> Self {
        let position = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(position + 1) % Self::ALL.len()]
    }
}

impl ThemeStyle {
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn user_prefix_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn user_text_style(&self) -> Style {
        Style::default()
    }

    pub fn assistant_label_style(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::DIM)
    }

    pub fn error_label_style(&self) -> Style {
        Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD)
    }

    pub fn thinking_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn heading_style(&self, level: u8) -> Style {
        let base = Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD);
        if level <= 1 {
            base.add_modifier(Modifier::UNDERLINED)
        } else {
            base
        }
    }

    pub fn inline_code_style(&self) -> Style {
        Style::default().fg(self.highlight)
    }

    pub fn math_style(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn quote_style(&self) -> Style {
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn link_style(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn code_block_fallback_style(&self) -> Style {
        Style::default().fg(Color::Gray)
    }
}
