use serde::{Deserialize, Serialize};
use votings_common::{Address, Amount};

use crate::round::VotingId;

/// Journal record of a successful state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    RoundCreated {
        id: VotingId,
        created: u64,
    },
    StakeCast {
        id: VotingId,
        voter: Address,
        candidate: Address,
        amount: Amount,
    },
    RoundClosed {
        id: VotingId,
        budget: Amount,
        commission: Amount,
        closed_at: u64,
    },
    CommissionWithdrawn {
        to: Address,
        amount: Amount,
    },
}

impl LedgerEvent {
    /// The voting this event belongs to, if any.
    pub fn voting(&self) -> Option<VotingId> {
        match self {
            LedgerEvent::RoundCreated { id, .. }
            | LedgerEvent::StakeCast { id, .. }
            | LedgerEvent::RoundClosed { id, .. } => Some(*id),
            LedgerEvent::CommissionWithdrawn { .. } => None,
        }
    }
}
