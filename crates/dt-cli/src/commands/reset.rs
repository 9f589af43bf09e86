//! Reset command: forget one document's time.
//!
//! Only use this while no `dt watch` is running against the same ledger;
//! a running watcher holds its own copy and will overwrite the file on its
//! next save. Send it a `reset` event instead.

use std::io::Write;

use anyhow::{Context, Result, bail};
use dt_core::format_time;
use dt_store::{LedgerFile, LoadOutcome};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, path: &str) -> Result<()> {
    let file = LedgerFile::new(&config.ledger_path);

    let mut ledger = match file.try_load()? {
        LoadOutcome::Loaded(ledger) => ledger,
        LoadOutcome::Missing => {
            writeln!(writer, "No time recorded for {path}.")?;
            return Ok(());
        }
        LoadOutcome::Corrupt(error) => {
            bail!("refusing to modify corrupt ledger {}: {error}", file.path().display())
        }
    };

    match ledger.reset(path) {
        Some(seconds) => {
            file.save(&ledger).context("failed to save ledger")?;
            writeln!(writer, "Reset {path} (was {}).", format_time(seconds))?;
        }
        None => writeln!(writer, "No time recorded for {path}.")?,
    }
    Ok(())
}
