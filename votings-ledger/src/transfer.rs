use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use votings_common::{Address, Amount};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Recipient {0} rejected the transfer")]
    Rejected(String),

    #[error("Transfer backend unavailable: {0}")]
    Unavailable(String),
}

/// Moves value out of the ledger.
///
/// The ledger calls this and nothing else when paying out; whoever embeds the
/// ledger decides what a transfer actually is.
pub trait ValueTransfer: Send {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

/// A completed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: Address,
    pub amount: Amount,
}

/// Transfer backend that only records what it was asked to pay.
#[derive(Debug, Default)]
pub struct InMemoryTransfers {
    payouts: Vec<Payout>,
    balances: HashMap<Address, Amount>,
    fail_next: Option<TransferError>,
}

impl InMemoryTransfers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transfer fail with `err`.
    pub fn fail_next(&mut self, err: TransferError) {
        self.fail_next = Some(err);
    }

    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    /// Total received by `address` through this backend.
    pub fn received(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }
}

impl ValueTransfer for InMemoryTransfers {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        *self.balances.entry(to.clone()).or_default() += amount;
        self.payouts.push(Payout { to: to.clone(), amount });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_payouts_and_balances() {
        let alice = Address::from_seed(&[1u8; 32]).unwrap();
        let mut transfers = InMemoryTransfers::new();

        transfers.transfer(&alice, 10).unwrap();
        transfers.transfer(&alice, 5).unwrap();

        assert_eq!(transfers.received(&alice), 15);
        assert_eq!(transfers.payouts().len(), 2);
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let alice = Address::from_seed(&[1u8; 32]).unwrap();
        let mut transfers = InMemoryTransfers::new();
        transfers.fail_next(TransferError::Unavailable("offline".into()));

        assert!(transfers.transfer(&alice, 10).is_err());
        assert_eq!(transfers.received(&alice), 0);
        assert!(transfers.transfer(&alice, 10).is_ok());
        assert_eq!(transfers.received(&alice), 10);
    }
}
