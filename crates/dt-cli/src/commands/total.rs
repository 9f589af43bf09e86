//! Total command: the hover-style summary for one path.

use std::io::Write;

use anyhow::Result;
use dt_core::{format_time, hover_line, subtree_total};
use dt_store::LedgerFile;
use serde_json::json;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, path: &str, json: bool) -> Result<()> {
    let ledger = LedgerFile::new(&config.ledger_path).load();
    let hierarchy = config.hierarchy(&ledger);
    let seconds = subtree_total(&ledger, hierarchy.as_ref(), path);

    if json {
        let value = json!({
            "path": path,
            "seconds": seconds,
            "formatted": format_time(seconds),
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(writer, "{}", hover_line(seconds))?;
    }
    Ok(())
}
