#![forbid(unsafe_code)]

use ratatui::style::Color;

use crate::config::UiConfig;
use crate::task::model::Priority;

/// Immutable colour palette handed to the draw functions. Defaults follow
/// the Tokyo Night palette; only the accent is user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub high: Color,
    pub medium: Color,
    pub low: Color,
    pub dark: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(0x7A, 0xA2, 0xF7),
            fg: Color::Rgb(0xC0, 0xCA, 0xF5),
            muted: Color::Rgb(0x56, 0x5F, 0x89),
            border: Color::Rgb(0x41, 0x48, 0x68),
            high: Color::Rgb(0xF7, 0x76, 0x8E),
            medium: Color::Rgb(0xE0, 0xAF, 0x68),
            low: Color::Rgb(0x9E, 0xCE, 0x6A),
            dark: Color::Rgb(0x1A, 0x1B, 0x26),
        }
    }
}

impl Theme {
    #[must_use]
    pub fn from_ui(ui: &UiConfig) -> Self {
        let mut theme = Self::default();
        if let Ok(accent) = ui.accent.trim().parse::<Color>() {
            theme.accent = accent;
        }
        theme
    }

    #[must_use]
    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}
