//! Watch command: runs the accrual engine against a live host event stream.
//!
//! Host events arrive as JSON lines (see [`crate::protocol`]). Alongside them
//! the loop drives a periodic tick for the status display and a single idle
//! timer, re-armed whenever the engine's idle deadline moves. Ledger writes
//! go through a [`SaveQueue`]; shutdown (event, end of input or Ctrl-C)
//! waits for it to drain.
//!
//! A `breadcrumb` event prints the ancestor-chain tooltip computed from the
//! live ledger, so the running session is included before it is committed.

use std::io::Write;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use dt_core::{
    AccrualEngine, Clock, DocumentId, LedgerSink, StatusLine, breadcrumb, render_tooltip,
};
use dt_store::{LedgerFile, SaveQueue};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, MissedTickBehavior, Sleep};

use crate::Config;
use crate::protocol::{HostEvent, parse_line};

/// Runs until the host shuts down, then persists the final ledger.
pub async fn run<C, R, W>(config: &Config, clock: C, input: R, writer: &mut W) -> Result<()>
where
    C: Clock + Clone,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let file = LedgerFile::new(&config.ledger_path);
    let ledger = file.load();
    let mut engine = AccrualEngine::new(
        &config.tracker_config(),
        ledger,
        clock.clone(),
        SaveQueue::spawn(file),
    );
    engine.start();

    let mut lines = input.lines();
    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let idle_timer = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(idle_timer);
    let mut armed_deadline = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ctrl_c_available = true;

    let mut shown = None;
    show_status(writer, &engine, &mut shown)?;

    loop {
        rearm_idle_timer(
            idle_timer.as_mut(),
            &mut armed_deadline,
            engine.idle_deadline_ms(),
            clock.now_ms(),
        );

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read host events")? else {
                    tracing::info!("host event stream closed");
                    break;
                };
                match parse_line(&line) {
                    Some(HostEvent::Open { path }) => engine.document_opened(Some(path)),
                    Some(HostEvent::Close) => engine.document_opened(None),
                    Some(HostEvent::Activity) => {
                        engine.record_activity();
                    }
                    Some(HostEvent::Reset { path }) => {
                        engine.reset(path.as_str());
                    }
                    Some(HostEvent::Breadcrumb { path }) => {
                        show_breadcrumb(writer, config, &engine, path.as_ref())?;
                    }
                    Some(HostEvent::Shutdown) => break,
                    None => {}
                }
            }
            _ = ticker.tick() => {
                engine.tick();
            }
            () = &mut idle_timer, if armed_deadline.is_some() => {
                armed_deadline = None;
                engine.tick();
            }
            signal = &mut ctrl_c, if ctrl_c_available => match signal {
                Ok(()) => {
                    tracing::info!("interrupted");
                    break;
                }
                Err(error) => {
                    tracing::warn!(%error, "cannot listen for ctrl-c");
                    ctrl_c_available = false;
                }
            },
        }

        show_status(writer, &engine, &mut shown)?;
    }

    engine.shutdown();
    show_status(writer, &engine, &mut shown)?;
    engine.into_sink().close().await;
    Ok(())
}

/// Points the idle timer at `deadline` if it moved since the last arm.
fn rearm_idle_timer(
    timer: Pin<&mut Sleep>,
    armed: &mut Option<i64>,
    deadline: Option<i64>,
    now_ms: i64,
) {
    if *armed == deadline {
        return;
    }
    *armed = deadline;
    if let Some(deadline) = deadline {
        let remaining = u64::try_from(deadline.saturating_sub(now_ms)).unwrap_or(0);
        timer.reset(Instant::now() + Duration::from_millis(remaining));
    }
}

/// Prints the status line when it differs from what was last shown.
fn show_status<W, C, S>(
    writer: &mut W,
    engine: &AccrualEngine<C, S>,
    shown: &mut Option<StatusLine>,
) -> Result<()>
where
    W: Write,
    C: Clock,
    S: LedgerSink,
{
    let status = engine.status();
    if *shown != Some(status) {
        writeln!(writer, "{status}")?;
        writer.flush()?;
        *shown = Some(status);
    }
    Ok(())
}

/// Prints the live tooltip for `path`, defaulting to the current document.
fn show_breadcrumb<W, C, S>(
    writer: &mut W,
    config: &Config,
    engine: &AccrualEngine<C, S>,
    path: Option<&DocumentId>,
) -> Result<()>
where
    W: Write,
    C: Clock,
    S: LedgerSink,
{
    let Some(doc) = path.or_else(|| engine.current_document()) else {
        tracing::debug!("breadcrumb requested without a current document");
        return Ok(());
    };
    let ledger = engine.live_ledger();
    let hierarchy = config.hierarchy(&ledger);
    let crumbs = breadcrumb(&ledger, hierarchy.as_ref(), doc);
    writeln!(writer, "{}", render_tooltip(&crumbs))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use dt_core::ManualClock;
    use insta::assert_snapshot;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn test_config(dir: &std::path::Path) -> Config {
        Config {
            ledger_path: dir.join("time-tracker.json"),
            // Keep periodic ticks out of the way of scripted events.
            tick_interval_ms: 600_000,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn scripted_session_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let clock = ManualClock::new(0);
        let (mut host, events) = tokio::io::duplex(4096);
        let mut output = Vec::new();

        let driver = async {
            let pause = || tokio::time::sleep(Duration::from_millis(20));
            host.write_all(b"{\"event\":\"open\",\"path\":\"notes/a.md\"}\n")
                .await
                .unwrap();
            pause().await;
            clock.set_ms(10_000);
            host.write_all(b"{\"event\":\"close\"}\n").await.unwrap();
            pause().await;
            clock.set_ms(12_000);
            host.write_all(b"{\"event\":\"open\",\"path\":\"notes/b.md\"}\n")
                .await
                .unwrap();
            pause().await;
            clock.set_ms(15_000);
            host.write_all(b"{\"event\":\"shutdown\"}\n").await.unwrap();
        };

        let (result, ()) = tokio::join!(
            run(&config, clock.clone(), BufReader::new(events), &mut output),
            driver
        );
        result.unwrap();

        let ledger = LedgerFile::new(&config.ledger_path).load();
        assert_eq!(ledger.get("notes/a.md"), 10);
        assert_eq!(ledger.get("notes/b.md"), 3);

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        ⏱️ Ready
        ⏱️ 00:00:00
        ⏱️ No file
        ⏱️ 00:00:00
        ⏱️ No file
        ");
    }

    #[tokio::test]
    async fn end_of_input_shuts_down_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let input: &[u8] = b"garbage\n{\"event\":\"open\",\"path\":\"a.md\"}\n";
        let mut output = Vec::new();

        run(&config, ManualClock::new(0), input, &mut output)
            .await
            .unwrap();

        assert!(config.ledger_path.exists());
        assert!(LedgerFile::new(&config.ledger_path).load().is_empty());
    }

    #[tokio::test]
    async fn existing_totals_are_extended() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.ledger_path, r#"{"a.md": 100}"#).unwrap();

        let clock = ManualClock::new(0);
        let (mut host, events) = tokio::io::duplex(4096);
        let mut output = Vec::new();

        let driver = async {
            host.write_all(b"{\"event\":\"open\",\"path\":\"a.md\"}\n")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            clock.set_ms(5_000);
            drop(host);
        };

        let (result, ()) = tokio::join!(
            run(&config, clock.clone(), BufReader::new(events), &mut output),
            driver
        );
        result.unwrap();

        assert_eq!(LedgerFile::new(&config.ledger_path).load().get("a.md"), 105);
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("⏱️ 00:01:40"), "{output}");
    }

    #[tokio::test]
    async fn reset_event_clears_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.ledger_path, r#"{"a.md": 100, "b.md": 4}"#).unwrap();
        let input: &[u8] = b"{\"event\":\"reset\",\"path\":\"a.md\"}\n{\"event\":\"shutdown\"}\n";
        let mut output = Vec::new();

        run(&config, ManualClock::new(0), input, &mut output)
            .await
            .unwrap();

        let ledger = LedgerFile::new(&config.ledger_path).load();
        assert!(!ledger.contains("a.md"));
        assert_eq!(ledger.get("b.md"), 4);
    }

    #[tokio::test]
    async fn breadcrumb_includes_running_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.ledger_path, r#"{"root/a.md": 10}"#).unwrap();

        let clock = ManualClock::new(0);
        let (mut host, events) = tokio::io::duplex(4096);
        let mut output = Vec::new();

        let driver = async {
            let pause = || tokio::time::sleep(Duration::from_millis(20));
            host.write_all(b"{\"event\":\"open\",\"path\":\"root/sub/b.md\"}\n")
                .await
                .unwrap();
            pause().await;
            clock.set_ms(5_000);
            host.write_all(b"{\"event\":\"breadcrumb\"}\n").await.unwrap();
            host.write_all(b"{\"event\":\"breadcrumb\",\"path\":\"root/a.md\"}\n")
                .await
                .unwrap();
            pause().await;
            host.write_all(b"{\"event\":\"shutdown\"}\n").await.unwrap();
        };

        let (result, ()) = tokio::join!(
            run(&config, clock.clone(), BufReader::new(events), &mut output),
            driver
        );
        result.unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        ⏱️ Ready
        ⏱️ 00:00:00
        Time spent:
        → root : 00:00:15
        → → sub : 00:00:05
        → → → b.md : 00:00:05
        ⏱️ 00:00:05
        Time spent:
        → root : 00:00:15
        → → a.md : 00:00:10
        ⏱️ No file
        ");
    }

    #[tokio::test]
    async fn breadcrumb_without_document_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let input: &[u8] = b"{\"event\":\"breadcrumb\"}\n{\"event\":\"shutdown\"}\n";
        let mut output = Vec::new();

        run(&config, ManualClock::new(0), input, &mut output)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "⏱️ Ready\n");
    }
}
