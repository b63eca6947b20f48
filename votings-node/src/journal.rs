use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use votings_common::{Address, Amount};
use votings_ledger::{Payout, TransferError, ValueTransfer};

/// Pays out by appending one JSON line per payout to a journal file, for an
/// operator or settlement job to act on.
#[derive(Debug, Clone)]
pub struct JournalTransfer {
    path: PathBuf,
}

impl JournalTransfer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read_all(&self) -> std::io::Result<Vec<Payout>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })
            .collect()
    }
}

impl ValueTransfer for JournalTransfer {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let unavailable = |e: String| TransferError::Unavailable(format!("{}: {}", self.path.display(), e));

        let line = serde_json::to_string(&Payout { to: to.clone(), amount })
            .map_err(|e| unavailable(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| unavailable(e.to_string()))?;
        writeln!(file, "{}", line).map_err(|e| unavailable(e.to_string()))?;
        file.sync_all().map_err(|e| unavailable(e.to_string()))
    }
}
