//! Breadcrumb command: time per ancestor of a document.

use std::io::Write;

use anyhow::{Context, Result};
use dt_core::{DocumentId, breadcrumb, format_time, render_tooltip};
use dt_store::LedgerFile;
use serde::Serialize;

use crate::Config;

/// One ancestor level in JSON output.
#[derive(Debug, Serialize)]
struct CrumbOutput {
    label: String,
    path: String,
    seconds: u64,
    formatted: String,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, path: &str, json: bool) -> Result<()> {
    let doc = DocumentId::new(path).context("invalid document path")?;
    let ledger = LedgerFile::new(&config.ledger_path).load();
    let hierarchy = config.hierarchy(&ledger);
    let crumbs = breadcrumb(&ledger, hierarchy.as_ref(), &doc);

    if json {
        let output: Vec<CrumbOutput> = crumbs
            .into_iter()
            .map(|c| CrumbOutput {
                formatted: format_time(c.seconds),
                label: c.label,
                path: c.path,
                seconds: c.seconds,
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        writeln!(writer, "{}", render_tooltip(&crumbs))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("time-tracker.json");
        std::fs::write(
            &ledger_path,
            r#"{"root/a.md": 10, "root/sub/b.md": 5, "root/sub/c.md": 7}"#,
        )
        .unwrap();
        let config = Config {
            ledger_path,
            ..Config::default()
        };
        (dir, config)
    }

    #[test]
    fn renders_tooltip() {
        let (_dir, config) = config();
        let mut output = Vec::new();

        run(&mut output, &config, "root/sub/b.md", false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Time spent:
        → root : 00:00:22
        → → sub : 00:00:12
        → → → b.md : 00:00:05
        ");
    }

    #[test]
    fn json_lists_root_to_leaf() {
        let (_dir, config) = config();
        let mut output = Vec::new();

        run(&mut output, &config, "root/sub/c.md", true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let labels: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["label"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(labels, ["root", "sub", "c.md"]);
        assert_eq!(value[2]["formatted"], "00:00:07");
    }

    #[test]
    fn rejects_empty_path() {
        let (_dir, config) = config();
        let mut output = Vec::new();
        assert!(run(&mut output, &config, "", false).is_err());
    }
}
