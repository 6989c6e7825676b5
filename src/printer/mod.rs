//! User-facing output with semantic emphasis.
//!
//! Commands talk to a [`Printer`] rather than stdout so the workflow logic can
//! be exercised without a terminal. `TerminalPrinter` maps each [`Emphasis`]
//! onto the palette in `cmd::format`.

use std::io::Write;

use crate::cmd::format::{Role, StyleOptions, color};

/// Semantic weight of a printed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Normal,
    Success,
    Warning,
    Error,
    Highlight,
}

impl Emphasis {
    fn role(self) -> Option<Role> {
        match self {
            Emphasis::Normal => None,
            Emphasis::Success => Some(Role::Success),
            Emphasis::Warning => Some(Role::Warning),
            Emphasis::Error => Some(Role::Error),
            Emphasis::Highlight => Some(Role::Accent),
        }
    }
}

pub trait Printer: Send + Sync {
    /// Print one message followed by a newline. Fire-and-forget.
    fn println(&self, message: &str, emphasis: Emphasis);
}

/// Prints to stdout, coloring according to [`StyleOptions`].
#[derive(Debug, Clone)]
pub struct TerminalPrinter {
    style: StyleOptions,
}

impl TerminalPrinter {
    pub fn new() -> Self {
        Self {
            style: StyleOptions::detect(),
        }
    }

    pub fn with_style(style: StyleOptions) -> Self {
        Self { style }
    }

    fn render(&self, message: &str, emphasis: Emphasis) -> String {
        match emphasis.role() {
            Some(role) => color(role, message, &self.style),
            None => message.to_string(),
        }
    }
}

impl Default for TerminalPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer for TerminalPrinter {
    fn println(&self, message: &str, emphasis: Emphasis) {
        let line = self.render(message, emphasis);
        let mut out = std::io::stdout().lock();
        // A closed stdout (e.g. piped into `head`) is not worth aborting over.
        let _ = writeln!(out, "{line}");
    }
}
