//! Report command: totals as a tree.

use std::io::Write;

use anyhow::Result;
use dt_core::{Hierarchy, Node, TimeLedger, format_time, subtree_total};
use dt_store::LedgerFile;
use serde::Serialize;

use crate::Config;

/// A node of the report tree.
#[derive(Debug, Clone, Serialize)]
pub struct ReportNode {
    pub path: String,
    pub label: String,
    pub seconds: u64,
    pub formatted: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ReportNode>,
}

/// Builds the report subtree rooted at `path`.
pub fn build_node(ledger: &TimeLedger, hierarchy: &dyn Hierarchy, path: &str) -> ReportNode {
    let children = match hierarchy.resolve(path) {
        Some(Node::Container(children)) => children
            .iter()
            .map(|child| build_node(ledger, hierarchy, child))
            .collect(),
        _ => Vec::new(),
    };
    let seconds = subtree_total(ledger, hierarchy, path);

    ReportNode {
        path: path.to_string(),
        label: path.rsplit('/').next().unwrap_or(path).to_string(),
        seconds,
        formatted: format_time(seconds),
        children,
    }
}

/// Formats report nodes as an indented tree, durations right-aligned.
pub fn format_report(nodes: &[ReportNode]) -> String {
    fn push(output: &mut String, node: &ReportNode, depth: usize) {
        output.push_str(&format!(
            "{:>10}  {}{}\n",
            node.formatted,
            "  ".repeat(depth),
            node.label
        ));
        for child in &node.children {
            push(output, child, depth + 1);
        }
    }

    if nodes.is_empty() {
        return "No time recorded.\n".to_string();
    }

    let mut output = String::new();
    for node in nodes {
        push(&mut output, node, 0);
    }
    output
}

pub fn run<W: Write>(writer: &mut W, config: &Config, path: Option<&str>, json: bool) -> Result<()> {
    let ledger = LedgerFile::new(&config.ledger_path).load();
    let hierarchy = config.hierarchy(&ledger);

    let nodes: Vec<ReportNode> = match path {
        Some(path) => vec![build_node(&ledger, hierarchy.as_ref(), path)],
        None => hierarchy
            .roots()
            .iter()
            .map(|root| build_node(&ledger, hierarchy.as_ref(), root))
            .collect(),
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&nodes)?)?;
    } else {
        write!(writer, "{}", format_report(&nodes))?;
    }
    Ok(())
}
