use std::{fs, io, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};
use votings_common::Address;

pub const DEFAULT_LOG_FILTER: &str = "info,votings_ledger=debug";

/// Where a deployed ledger lives and who owns it.
///
/// Relative paths are resolved against the directory holding the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub owner: Address,
    pub state_path: PathBuf,
    pub payout_journal: PathBuf,
    pub audit_log: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl NodeConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            state_path: PathBuf::from("ledger.json"),
            payout_journal: PathBuf::from("payouts.jsonl"),
            audit_log: PathBuf::from("logs/audit.log"),
            log_filter: default_log_filter(),
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<NodeConfig>(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(parsed)
    }

    /// Joins `path` onto the config's directory unless it is already absolute.
    pub fn resolve(config_path: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        config_path
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }
}
