use std::fs;
use std::path::Path;

use tracing::info;
use votings_common::Result;

use crate::ledger::VotingLedger;

impl VotingLedger {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a snapshot and refuses it unless every invariant holds.
    pub fn from_json(data: &str) -> Result<Self> {
        let ledger: VotingLedger = serde_json::from_str(data)?;
        ledger.verify_invariants()?;
        Ok(ledger)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Readers never see a half-written snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, self.to_json()?)?;
        fs::rename(&tmp, path)?;
        info!("💾 Ledger saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }
}
