//! Host events accepted by `dt watch`, one JSON object per line.
//!
//! ```text
//! {"event":"open","path":"notes/a.md"}
//! {"event":"close"}
//! {"event":"activity"}
//! {"event":"reset","path":"notes/a.md"}
//! {"event":"breadcrumb"}
//! {"event":"breadcrumb","path":"notes/b.md"}
//! {"event":"shutdown"}
//! ```

use dt_core::DocumentId;
use serde::{Deserialize, Serialize};

/// An event from the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// The current document changed.
    Open { path: DocumentId },
    /// No document is current any more.
    Close,
    /// Any user input.
    Activity,
    /// Forget the time recorded for a document.
    Reset { path: DocumentId },
    /// Print the live ancestor-chain tooltip for `path`, or for the current
    /// document when omitted.
    Breadcrumb {
        #[serde(default)]
        path: Option<DocumentId>,
    },
    /// The host is exiting.
    Shutdown,
}

/// Parses one line. Blank lines and malformed events yield `None`; the
/// latter are logged.
pub fn parse_line(line: &str) -> Option<HostEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(error) => {
            tracing::warn!(%error, line, "ignoring malformed host event");
            None
        }
    }
}
