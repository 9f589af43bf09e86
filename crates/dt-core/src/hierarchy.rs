//! Folder-level aggregation over a document hierarchy.
//!
//! The hierarchy itself belongs to the host (a vault directory, a workspace
//! model). It is consumed through [`Hierarchy`], which answers one question:
//! what is at this path?

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::ledger::TimeLedger;
use crate::types::{DocumentId, PATH_SEPARATOR};

/// What a hierarchy path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A trackable document.
    Leaf(DocumentId),
    /// A folder, with the full paths of its direct children.
    Container(Vec<String>),
}

/// Read-only view of the host's document namespace.
///
/// Implementations must not contain cycles.
pub trait Hierarchy {
    /// Resolves a path, or `None` if nothing exists there.
    fn resolve(&self, path: &str) -> Option<Node>;

    /// Paths of the top-level nodes.
    fn roots(&self) -> Vec<String>;
}

/// Total seconds under `path`.
///
/// Leaves read their ledger entry; containers sum every leaf beneath them
/// plus their own entry, if any (a ledger key may also prefix other keys).
/// Paths the hierarchy does not know fall back to a direct ledger lookup, so
/// documents deleted from the host still report their time, and anything
/// else reports 0.
pub fn subtree_total<H: Hierarchy + ?Sized>(
    ledger: &TimeLedger,
    hierarchy: &H,
    path: &str,
) -> u64 {
    let mut total = 0u64;
    let mut pending = vec![path.to_string()];

    while let Some(next) = pending.pop() {
        match hierarchy.resolve(&next) {
            Some(Node::Container(children)) => {
                total = total.saturating_add(ledger.get(&next));
                pending.extend(children);
            }
            Some(Node::Leaf(doc)) => total = total.saturating_add(ledger.get(doc.as_str())),
            None => total = total.saturating_add(ledger.get(&next)),
        }
    }

    total
}

/// One level of an ancestor-chain breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    /// Full path of this level.
    pub path: String,
    /// Last segment of the path.
    pub label: String,
    /// 1 for the top-level ancestor, increasing towards the document.
    pub depth: usize,
    pub seconds: u64,
}

/// Subtree totals for every ancestor of `doc`, root first, ending with `doc`.
pub fn breadcrumb<H: Hierarchy + ?Sized>(
    ledger: &TimeLedger,
    hierarchy: &H,
    doc: &DocumentId,
) -> Vec<Crumb> {
    doc.ancestry()
        .into_iter()
        .enumerate()
        .map(|(idx, path)| Crumb {
            path: path.to_string(),
            label: path
                .rsplit(PATH_SEPARATOR)
                .next()
                .unwrap_or(path)
                .to_string(),
            depth: idx + 1,
            seconds: subtree_total(ledger, hierarchy, path),
        })
        .collect()
}

/// A hierarchy inferred from `/`-separated document paths.
///
/// Every proper prefix of a path is a container. Used when no host namespace
/// is available, e.g. when reporting straight from a saved ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerTree {
    children: BTreeMap<String, BTreeSet<String>>,
    leaves: BTreeSet<String>,
    roots: BTreeSet<String>,
}

impl LedgerTree {
    pub fn from_ledger(ledger: &TimeLedger) -> Self {
        Self::from_paths(ledger.iter().map(|(doc, _)| doc.as_str()))
    }

    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = Self::default();
        for path in paths {
            let Ok(doc) = DocumentId::new(path) else {
                continue;
            };
            let ancestry = doc.ancestry();
            if let Some(first) = ancestry.first() {
                tree.roots.insert((*first).to_string());
            }
            for pair in ancestry.windows(2) {
                tree.children
                    .entry(pair[0].to_owned())
                    .or_default()
                    .insert(pair[1].to_owned());
            }
            tree.leaves.insert(path.to_string());
        }
        tree
    }
}

impl Hierarchy for LedgerTree {
    fn resolve(&self, path: &str) -> Option<Node> {
        if let Some(children) = self.children.get(path) {
            return Some(Node::Container(children.iter().cloned().collect()));
        }
        if self.leaves.contains(path) {
            return DocumentId::new(path).ok().map(Node::Leaf);
        }
        None
    }

    fn roots(&self) -> Vec<String> {
        self.roots.iter().cloned().collect()
    }
}
