//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dt_core::{Hierarchy, LedgerTree, TimeLedger, TrackerConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::vault::VaultTree;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the ledger file.
    pub ledger_path: PathBuf,

    /// Directory whose layout defines the document hierarchy.
    ///
    /// When unset, folders are inferred from the ledger's own paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_root: Option<PathBuf>,

    /// Seconds without activity before the user counts as idle.
    pub idle_timeout_secs: u64,

    /// Activity signals closer together than this are evaluated once.
    pub activity_coalesce_ms: u64,

    /// Period of the display/idle-check tick.
    pub tick_interval_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ledger_path", &self.ledger_path)
            .field("vault_root", &self.vault_root)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("activity_coalesce_ms", &self.activity_coalesce_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            ledger_path: config_dir.join("time-tracker.json"),
            vault_root: None,
            idle_timeout_secs: 180,
            activity_coalesce_ms: 200,
            tick_interval_ms: 1_000,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DT_*)
        figment = figment.merge(Env::prefixed("DT_"));

        figment.extract()
    }

    /// Presence-detection settings for the engine. The idle timeout is at
    /// least one second; zero would mark every resume idle on the next tick.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs.max(1)),
            activity_coalesce: Duration::from_millis(self.activity_coalesce_ms),
        }
    }

    /// Tick period, never shorter than 10ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }

    /// The document hierarchy for aggregation queries.
    pub fn hierarchy(&self, ledger: &TimeLedger) -> Box<dyn Hierarchy> {
        match &self.vault_root {
            Some(root) => Box::new(VaultTree::new(root)),
            None => Box::new(LedgerTree::from_ledger(ledger)),
        }
    }
}

/// Returns the platform-specific config directory for doctime.
///
/// On Linux: `~/.config/doctime`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("doctime"))
}
