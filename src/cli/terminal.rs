//! Colored terminal output

use owo_colors::{OwoColorize, colors::css};

/// How a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Warning,
    Muted,
}

fn paint(text: &str, tone: Tone) -> String {
    if supports_color::on(supports_color::Stream::Stdout).is_none() {
        return text.to_string();
    }

    match tone {
        Tone::Success => text.fg::<css::OrangeRed>().to_string(),
        Tone::Warning => text.fg::<css::Gold>().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}

/// Extension trait for colorizing CLI messages
pub trait Colorize: AsRef<str> {
    /// A change was applied
    fn success(&self) -> String {
        paint(self.as_ref(), Tone::Success)
    }

    /// Nothing was changed, but the user should notice
    fn warning(&self) -> String {
        paint(self.as_ref(), Tone::Warning)
    }

    /// Informational, low-priority output
    fn dim(&self) -> String {
        paint(self.as_ref(), Tone::Muted)
    }
}

impl<T: AsRef<str> + ?Sized> Colorize for T {}
