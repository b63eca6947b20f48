use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Who is calling and when.
///
/// Every ledger operation receives one of these instead of reading an
/// ambient sender or clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }

    /// Same caller, later (or earlier) instant.
    pub fn at(&self, timestamp: u64) -> Self {
        Self {
            caller: self.caller.clone(),
            timestamp,
        }
    }
}
