//! Text for status bars and tooltips.

use std::fmt;

use crate::format::format_time;
use crate::hierarchy::Crumb;

/// What the status display shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    /// Started, no document event yet.
    Ready,
    /// The host has no current document.
    NoDocument,
    /// Live total for the current document.
    Tracking(u64),
    /// The user is idle; time is paused.
    Idle,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "⏱️ Ready"),
            Self::NoDocument => write!(f, "⏱️ No file"),
            Self::Tracking(seconds) => write!(f, "⏱️ {}", format_time(*seconds)),
            Self::Idle => write!(f, "😴 Idle..."),
        }
    }
}

/// Renders an ancestor-chain breakdown, one indented line per level.
pub fn render_tooltip(crumbs: &[Crumb]) -> String {
    let mut output = String::from("Time spent:");
    for crumb in crumbs {
        output.push_str(&format!(
            "\n{}{} : {}",
            "→ ".repeat(crumb.depth),
            crumb.label,
            format_time(crumb.seconds)
        ));
    }
    output
}

/// Single-line annotation for hovering over any tree node.
pub fn hover_line(seconds: u64) -> String {
    format!("Time spent: {}", format_time(seconds))
}
