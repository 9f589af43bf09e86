//! Core domain logic for doctime.
//!
//! This crate contains the fundamental types and logic for:
//! - Idle detection: deciding from activity signals whether the user is present
//! - Accrual: committing focused time per document into a [`TimeLedger`]
//! - Aggregation: summing ledger totals over a document hierarchy
//! - Presentation: duration formatting, status text and ancestor tooltips

pub mod clock;
pub mod display;
mod engine;
pub mod format;
pub mod hierarchy;
mod idle;
pub mod ledger;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{StatusLine, hover_line, render_tooltip};
pub use engine::{AccrualEngine, ActiveSession, LedgerSink, TrackerConfig};
pub use format::format_time;
pub use hierarchy::{Crumb, Hierarchy, LedgerTree, Node, breadcrumb, subtree_total};
pub use idle::{IdleDetector, IdleTransition};
pub use ledger::TimeLedger;
pub use types::{DocumentId, ValidationError};
