//! Semantic terminal styling.
//!
//! Thin trait over owo-colors so call sites say what a message *means*
//! rather than which color it gets. Styling is suppressed wholesale when
//! `NO_COLOR` is set.

use std::fmt::Display;

use owo_colors::{OwoColorize, Style};

/// Honors the NO_COLOR convention.
pub fn no_color() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

fn paint<T: Display>(text: &T, style: Style) -> String {
    if no_color() {
        text.to_string()
    } else {
        text.style(style).to_string()
    }
}

/// Applies a semantic style to anything displayable.
pub trait Paint: Display + Sized {
    /// Good news (green bold).
    fn ok(&self) -> String {
        paint(self, Style::new().green().bold())
    }

    /// Bad news (red bold).
    fn bad(&self) -> String {
        paint(self, Style::new().red().bold())
    }

    /// Caution (yellow).
    fn caution(&self) -> String {
        paint(self, Style::new().yellow())
    }

    /// Informational (cyan).
    fn note(&self) -> String {
        paint(self, Style::new().cyan())
    }

    /// Secondary text (dimmed).
    fn dim(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    /// Emphasis (bold).
    fn strong(&self) -> String {
        paint(self, Style::new().bold())
    }
}

impl<T: Display> Paint for T {}
