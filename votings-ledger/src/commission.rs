use serde::{Deserialize, Serialize};
use votings_common::{Amount, LedgerError, Result};

use crate::constants::COMMISSION_PERCENT;

/// Owner's cut of a closed voting's budget. Floors to the wei.
///
/// Splits the budget at 100 so no budget, however large, overflows.
pub fn commission_for(budget: Amount) -> Amount {
    budget / 100 * COMMISSION_PERCENT + budget % 100 * COMMISSION_PERCENT / 100
}

/// Running commission balance owed to the ledger owner.
///
/// `accrued == credited - withdrawn` at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionAccount {
    accrued: Amount,
    credited: Amount,
    withdrawn: Amount,
}

impl CommissionAccount {
    pub fn accrued(&self) -> Amount {
        self.accrued
    }

    /// Total ever credited by closed votings.
    pub fn credited(&self) -> Amount {
        self.credited
    }

    /// Total ever paid out to the owner.
    pub fn withdrawn(&self) -> Amount {
        self.withdrawn
    }

    /// Validates a credit without applying it.
    pub(crate) fn check_credit(&self, amount: Amount) -> Result<()> {
        self.accrued
            .checked_add(amount)
            .and(self.credited.checked_add(amount))
            .map(|_| ())
            .ok_or_else(|| LedgerError::Overflow("accrued commission".to_string()))
    }

    pub(crate) fn credit(&mut self, amount: Amount) -> Result<()> {
        self.check_credit(amount)?;
        self.accrued += amount;
        self.credited += amount;
        Ok(())
    }

    /// Marks the whole accrued balance as paid out and returns it.
    pub(crate) fn settle(&mut self) -> Amount {
        let amount = std::mem::take(&mut self.accrued);
        self.withdrawn += amount;
        amount
    }

    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.credited.checked_sub(self.withdrawn) != Some(self.accrued) {
            return Err(LedgerError::Corrupted(format!(
                "commission accrued {} but credited {} and withdrawn {}",
                self.accrued, self.credited, self.withdrawn
            )));
        }
        Ok(())
    }
}
