//! Status command for showing where the ledger lives and what it holds.

use std::io::Write;

use anyhow::Result;
use dt_core::format_time;
use dt_store::{LedgerFile, LoadOutcome};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let file = LedgerFile::new(&config.ledger_path);

    writeln!(writer, "Time tracker status")?;
    writeln!(writer, "Ledger: {}", file.path().display())?;

    match file.try_load()? {
        LoadOutcome::Missing => writeln!(writer, "No time recorded.")?,
        LoadOutcome::Corrupt(error) => writeln!(writer, "Ledger is corrupt: {error}")?,
        LoadOutcome::Loaded(ledger) if ledger.is_empty() => writeln!(writer, "No time recorded.")?,
        LoadOutcome::Loaded(ledger) => {
            writeln!(writer, "Documents: {}", ledger.len())?;
            writeln!(writer, "Total: {}", format_time(ledger.total()))?;
        }
    }

    Ok(())
}
