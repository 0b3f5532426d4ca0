// ============================================================================
// Palettes de couleurs (clair / sombre)
// ============================================================================

use ratatui::style::{Color, Modifier, Style};

use crate::config::Theme;

/// Couleurs utilisées par le dashboard
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub up: Color,
    pub down: Color,
    pub favorite: Color,
    pub highlight: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Color::White,
                text: Color::Black,
                muted: Color::DarkGray,
                border: Color::Blue,
                accent: Color::Blue,
                up: Color::Green,
                down: Color::Red,
                favorite: Color::Yellow,
                highlight: Color::Rgb(219, 234, 254),
                error: Color::Red,
            },
            Theme::Dark => Self {
                background: Color::Rgb(17, 24, 39),
                text: Color::Gray,
                muted: Color::DarkGray,
                border: Color::Cyan,
                accent: Color::Cyan,
                up: Color::LightGreen,
                down: Color::LightRed,
                favorite: Color::Yellow,
                highlight: Color::Rgb(31, 41, 55),
                error: Color::LightRed,
            },
        }
    }

    /// Style de base (fond + texte)
    pub fn base(&self) -> Style {
        Style::default().bg(self.background).fg(self.text)
    }

    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }
}
