//! Active-time accrual engine.
//!
//! Decides, from document switches, activity signals and periodic ticks,
//! which document is accruing time and commits elapsed time to the ledger.
//!
//! # State
//!
//! - *current document*: what the host says is open, independent of presence
//! - *session*: an uncommitted interval for the current document, present only
//!   while a document is current and the user is active
//!
//! Every path that ends or replaces a session goes through a single flush:
//! `elapsed = floor((now - started_at) / 1000)` seconds, added to the ledger
//! only when positive. Each segment is floored on its own, so many short
//! segments can add up to less than one long one.

use std::time::Duration;

use crate::clock::Clock;
use crate::display::StatusLine;
use crate::idle::{IdleDetector, IdleTransition};
use crate::ledger::TimeLedger;
use crate::types::DocumentId;

/// Tunables for presence detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// No activity for this long marks the user idle.
    /// Default: 180 seconds.
    pub idle_timeout: Duration,

    /// Activity signals closer together than this are evaluated once.
    /// Default: 200 milliseconds.
    pub activity_coalesce: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(180),
            activity_coalesce: Duration::from_millis(200),
        }
    }
}

/// Destination for ledger snapshots.
///
/// `save` is a request: implementations may write synchronously or hand the
/// snapshot to a background writer. Failures are the sink's to report; the
/// engine's in-memory ledger stays authoritative either way.
pub trait LedgerSink {
    fn save(&mut self, ledger: &TimeLedger);
}

impl<S: LedgerSink + ?Sized> LedgerSink for Box<S> {
    fn save(&mut self, ledger: &TimeLedger) {
        (**self).save(ledger);
    }
}

/// An uncommitted interval of active time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub document: DocumentId,
    pub started_at_ms: i64,
}

impl ActiveSession {
    /// Whole seconds elapsed at `now_ms`, floored and never negative.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        u64::try_from(now_ms.saturating_sub(self.started_at_ms) / 1000).unwrap_or(0)
    }
}

/// Accounting state machine.
///
/// Construct once per process with the loaded ledger, call [`start`] and
/// route host events to the handlers. Handlers run to completion; the engine
/// holds no locks.
///
/// [`start`]: AccrualEngine::start
pub struct AccrualEngine<C, S> {
    clock: C,
    sink: S,
    detector: IdleDetector,
    ledger: TimeLedger,
    current: Option<DocumentId>,
    session: Option<ActiveSession>,
    document_seen: bool,
}

impl<C: Clock, S: LedgerSink> AccrualEngine<C, S> {
    pub fn new(config: &TrackerConfig, ledger: TimeLedger, clock: C, sink: S) -> Self {
        Self {
            clock,
            sink,
            detector: IdleDetector::new(config.idle_timeout, config.activity_coalesce),
            ledger,
            current: None,
            session: None,
            document_seen: false,
        }
    }

    /// Marks the user present and arms the idle deadline.
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.detector.arm(now);
        tracing::info!(documents = self.ledger.len(), "time tracking started");
    }

    /// Handles a change of the host's current document.
    ///
    /// Always flushes the previous session first, including when `doc` is the
    /// document already being tracked (the session then restarts at now).
    pub fn document_opened(&mut self, doc: Option<DocumentId>) {
        self.flush();
        self.document_seen = true;
        self.current = doc;

        match &self.current {
            Some(doc) if self.detector.is_active() => {
                tracing::debug!(document = %doc, "session started");
                self.session = Some(ActiveSession {
                    document: doc.clone(),
                    started_at_ms: self.clock.now_ms(),
                });
            }
            Some(doc) => tracing::debug!(document = %doc, "document opened while idle"),
            None => tracing::debug!("no current document"),
        }
    }

    /// Feeds an activity signal to the idle detector, resuming a session if
    /// it ends an idle period.
    pub fn record_activity(&mut self) -> Option<IdleTransition> {
        let transition = self.detector.record_activity(self.clock.now_ms());
        if transition == Some(IdleTransition::Resumed) {
            self.resume_transition();
        }
        transition
    }

    /// Periodic tick: checks the idle deadline and flushes when it has passed.
    ///
    /// The ledger is only touched on an idle transition. Use
    /// [`live_total`](Self::live_total) for display.
    pub fn tick(&mut self) -> Option<IdleTransition> {
        let transition = self.detector.tick(self.clock.now_ms());
        if transition == Some(IdleTransition::Idle) {
            self.idle_transition();
        }
        transition
    }

    /// Ends the session without forgetting the current document.
    ///
    /// Calling this again before a resume is a no-op.
    pub fn idle_transition(&mut self) {
        if self.session.is_some() {
            tracing::info!("user inactive, timer paused");
        }
        self.flush();
    }

    /// Restarts a session for the current document if none is running.
    pub fn resume_transition(&mut self) {
        if self.session.is_some() {
            return;
        }
        if let Some(doc) = &self.current {
            tracing::info!(document = %doc, "user active again, timer resumed");
            self.session = Some(ActiveSession {
                document: doc.clone(),
                started_at_ms: self.clock.now_ms(),
            });
        }
    }

    /// Flushes any session, persists the ledger unconditionally and clears
    /// session state.
    ///
    /// The sink decides whether the write is synchronous; a caller using a
    /// background writer must wait for it to drain before exiting.
    pub fn shutdown(&mut self) {
        self.commit_session();
        self.sink.save(&self.ledger);
        self.current = None;
        tracing::info!(documents = self.ledger.len(), "time tracking stopped");
    }

    /// Removes a document's accumulated time and persists the result.
    ///
    /// A running session on that document restarts at now so the discarded
    /// interval is not committed later.
    pub fn reset(&mut self, doc: &str) -> Option<u64> {
        let removed = self.ledger.reset(doc);
        let now = self.clock.now_ms();
        if let Some(session) = self.session.as_mut().filter(|s| s.document.as_str() == doc) {
            session.started_at_ms = now;
        }
        self.sink.save(&self.ledger);
        removed
    }

    /// Live total for the tracked document: committed time plus the running
    /// session. `None` when no session is running.
    pub fn live_total(&self) -> Option<u64> {
        let session = self.session.as_ref()?;
        let committed = self.ledger.get(session.document.as_str());
        Some(committed.saturating_add(session.elapsed_secs(self.clock.now_ms())))
    }

    /// The ledger with the running session folded in, without committing it.
    pub fn live_ledger(&self) -> TimeLedger {
        let mut ledger = self.ledger.clone();
        if let Some(session) = &self.session {
            let elapsed = session.elapsed_secs(self.clock.now_ms());
            if elapsed > 0 {
                ledger.add(&session.document, elapsed);
            }
        }
        ledger
    }

    /// What a status display should show right now.
    pub fn status(&self) -> StatusLine {
        match (&self.current, self.live_total()) {
            (_, Some(total)) => StatusLine::Tracking(total),
            (None, None) if !self.document_seen => StatusLine::Ready,
            (None, None) => StatusLine::NoDocument,
            (Some(_), None) if !self.detector.is_active() => StatusLine::Idle,
            (Some(doc), None) => StatusLine::Tracking(self.ledger.get(doc.as_str())),
        }
    }

    pub const fn ledger(&self) -> &TimeLedger {
        &self.ledger
    }

    pub const fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub const fn current_document(&self) -> Option<&DocumentId> {
        self.current.as_ref()
    }

    pub const fn is_active(&self) -> bool {
        self.detector.is_active()
    }

    /// When the idle timer should next fire, if armed.
    pub const fn idle_deadline_ms(&self) -> Option<i64> {
        self.detector.deadline_ms()
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the engine, returning its sink (e.g. to drain a writer).
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Commits the running session and saves if anything was added.
    fn flush(&mut self) {
        if self.commit_session() {
            self.sink.save(&self.ledger);
        }
    }

    /// Clears the session, adding its elapsed whole seconds to the ledger.
    /// Returns true when the ledger changed.
    fn commit_session(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        let elapsed = session.elapsed_secs(self.clock.now_ms());
        if elapsed == 0 {
            tracing::debug!(document = %session.document, "session under one second, skipped");
            return false;
        }

        let total = self.ledger.add(&session.document, elapsed);
        tracing::debug!(document = %session.document, elapsed, total, "session committed");
        true
    }
}
