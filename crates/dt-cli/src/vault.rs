//! Document hierarchy backed by a directory on disk.
//!
//! Paths are relative to the vault root and `/`-separated, matching the
//! document IDs the host reports. Hidden entries (names starting with `.`)
//! are not part of the hierarchy, and symlinks are never followed so the
//! walk cannot loop.

use std::fs;
use std::path::{Path, PathBuf};

use dt_core::{DocumentId, Hierarchy, Node};

/// A vault directory.
#[derive(Debug, Clone)]
pub struct VaultTree {
    root: PathBuf,
}

impl VaultTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn on_disk(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Visible child names of a directory, sorted.
    fn child_names(dir: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            tracing::debug!(dir = %dir.display(), "unreadable vault directory");
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }
}

impl Hierarchy for VaultTree {
    fn resolve(&self, path: &str) -> Option<Node> {
        if path.is_empty() || path.split('/').any(|s| s == ".." || s.starts_with('.')) {
            return None;
        }

        let full = self.on_disk(path);
        let meta = fs::symlink_metadata(&full).ok()?;

        if meta.is_dir() {
            let prefix = path.trim_end_matches('/');
            let children = Self::child_names(&full)
                .into_iter()
                .map(|name| format!("{prefix}/{name}"))
                .collect();
            Some(Node::Container(children))
        } else if meta.is_file() {
            DocumentId::new(path).ok().map(Node::Leaf)
        } else {
            None
        }
    }

    fn roots(&self) -> Vec<String> {
        Self::child_names(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dt_core::{TimeLedger, subtree_total};

    fn doc(path: &str) -> DocumentId {
        DocumentId::new(path).unwrap()
    }

    fn vault() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("root/sub")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("root/a.md"), "").unwrap();
        fs::write(root.join("root/sub/b.md"), "").unwrap();
        fs::write(root.join("root/sub/c.md"), "").unwrap();
        fs::write(root.join(".obsidian/time-tracker.json"), "{}").unwrap();
        dir
    }

    #[test]
    fn resolves_files_and_folders() {
        let dir = vault();
        let tree = VaultTree::new(dir.path());

        assert_eq!(tree.resolve("root/a.md"), Some(Node::Leaf(doc("root/a.md"))));
        assert_eq!(
            tree.resolve("root/sub"),
            Some(Node::Container(vec![
                "root/sub/b.md".to_string(),
                "root/sub/c.md".to_string()
            ]))
        );
        assert_eq!(tree.resolve("root/missing.md"), None);
        assert_eq!(tree.resolve(".obsidian"), None);
        assert_eq!(tree.resolve("../etc"), None);
    }

    #[test]
    fn roots_skip_hidden_entries() {
        let dir = vault();
        assert_eq!(VaultTree::new(dir.path()).roots(), vec!["root".to_string()]);
    }

    #[test]
    fn aggregates_over_disk_layout() {
        let dir = vault();
        let tree = VaultTree::new(dir.path());
        let ledger: TimeLedger = [
            (doc("root/a.md"), 10),
            (doc("root/sub/b.md"), 5),
            (doc("root/sub/c.md"), 7),
        ]
        .into_iter()
        .collect();

        assert_eq!(subtree_total(&ledger, &tree, "root/sub"), 12);
        assert_eq!(subtree_total(&ledger, &tree, "root"), 22);
        assert_eq!(subtree_total(&ledger, &tree, "root/missing.md"), 0);
    }
}
