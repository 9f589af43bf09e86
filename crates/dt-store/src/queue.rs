//! Background writer for ledger snapshots.
//!
//! At most one write is in flight. Requests that arrive while a write is
//! running are coalesced: only the newest snapshot is written next. Since
//! each snapshot is the whole ledger, skipping intermediate ones loses
//! nothing.

use dt_core::{LedgerSink, TimeLedger};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::LedgerFile;

enum Request {
    Save(TimeLedger),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task.
///
/// Must be created inside a tokio runtime. Call [`close`](Self::close)
/// before exiting so queued snapshots reach disk.
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<Request>,
    worker: JoinHandle<()>,
}

impl SaveQueue {
    pub fn spawn(file: LedgerFile) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_writer(file, rx));
        Self { tx, worker }
    }

    /// Waits until every snapshot requested so far has been written (or
    /// superseded by a newer written one).
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Request::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Drains pending snapshots and stops the writer.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(error) = self.worker.await {
            tracing::error!(%error, "ledger writer task failed");
        }
    }
}

impl LedgerSink for SaveQueue {
    fn save(&mut self, ledger: &TimeLedger) {
        if self.tx.send(Request::Save(ledger.clone())).is_err() {
            tracing::error!("ledger writer stopped, snapshot dropped");
        }
    }
}

async fn run_writer(file: LedgerFile, mut rx: mpsc::UnboundedReceiver<Request>) {
    while let Some(first) = rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();

        let mut absorb = |request| match request {
            Request::Save(ledger) => latest = Some(ledger),
            Request::Flush(ack) => waiters.push(ack),
        };
        absorb(first);
        while let Ok(request) = rx.try_recv() {
            absorb(request);
        }

        if let Some(ledger) = latest {
            let file = file.clone();
            let written = tokio::task::spawn_blocking(move || file.save_or_log(&ledger)).await;
            if let Err(error) = written {
                tracing::error!(%error, "ledger write panicked");
            }
        }

        for ack in waiters {
            let _ = ack.send(());
        }
    }
    tracing::debug!("ledger writer drained");
}
