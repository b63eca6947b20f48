//! Untyped entry point: raw caller, id and value strings as they arrive from a
//! command line or an RPC body, resolved into typed ledger calls.

use serde::{Deserialize, Serialize};
use votings_common::{parse_ether, Address, Amount, CallContext, LedgerError, Result};

use crate::ledger::VotingLedger;
use crate::round::{RoundSnapshot, VotingId};
use crate::transfer::ValueTransfer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateRound,
    GetRound {
        #[serde(default)]
        id: Option<String>,
    },
    CastStake {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        candidate: Option<String>,
        /// Ether amount, e.g. `"0.01"`.
        #[serde(default)]
        value: Option<String>,
    },
    CloseRound {
        #[serde(default)]
        id: Option<String>,
    },
    ShowCommission,
    WithdrawCommission,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateRound => "create_round",
            Operation::GetRound { .. } => "get_round",
            Operation::CastStake { .. } => "cast_stake",
            Operation::CloseRound { .. } => "close_round",
            Operation::ShowCommission => "show_commission",
            Operation::WithdrawCommission => "withdraw_commission",
        }
    }

    fn owner_only(&self) -> bool {
        matches!(
            self,
            Operation::CreateRound
                | Operation::CloseRound { .. }
                | Operation::ShowCommission
                | Operation::WithdrawCommission
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub caller: String,
    pub timestamp: u64,
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Created(VotingId),
    Round(RoundSnapshot),
    Staked,
    Closed { commission: Amount },
    Commission(Amount),
    Withdrawn(Amount),
}

impl Request {
    pub fn new(caller: impl Into<String>, timestamp: u64, operation: Operation) -> Self {
        Self {
            caller: caller.into(),
            timestamp,
            operation,
        }
    }

    /// Validates the caller string. A malformed caller can never be the
    /// owner, so owner-only operations report it as unauthorized.
    fn context(&self) -> Result<CallContext> {
        match Address::try_from(self.caller.as_str()) {
            Ok(caller) => Ok(CallContext::new(caller, self.timestamp)),
            Err(_) if self.operation.owner_only() => Err(LedgerError::Unauthorized(self.caller.clone())),
            Err(e) => Err(LedgerError::InvalidCaller(format!("'{}': {}", self.caller, e))),
        }
    }
}

/// Missing value means nothing attached, which the ledger rejects as an
/// invalid stake in its usual order.
fn parse_value(value: Option<&str>) -> Result<Amount> {
    match value {
        None => Ok(0),
        Some(v) => parse_ether(v).map_err(|_| LedgerError::InvalidStake),
    }
}

impl VotingLedger {
    /// Resolves and runs one request.
    pub fn execute(&mut self, request: &Request, transfers: &mut dyn ValueTransfer) -> Result<Response> {
        match &request.operation {
            Operation::GetRound { id } => {
                let id = VotingId::parse(id.as_deref())?;
                self.get_round(id).map(Response::Round)
            }
            Operation::CreateRound => {
                let ctx = request.context()?;
                self.create_round(&ctx).map(Response::Created)
            }
            Operation::CastStake { id, candidate, value } => {
                let id = VotingId::parse(id.as_deref())?;
                self.open_round(id)?;
                let ctx = request.context()?;
                let amount = parse_value(value.as_deref())?;
                self.cast_stake(&ctx, id, candidate.as_deref().unwrap_or(""), amount)
                    .map(|_| Response::Staked)
            }
            Operation::CloseRound { id } => {
                let ctx = request.context()?;
                let id = VotingId::parse(id.as_deref())?;
                self.close_round(&ctx, id)
                    .map(|commission| Response::Closed { commission })
            }
            Operation::ShowCommission => {
                let ctx = request.context()?;
                self.show_commission(&ctx).map(Response::Commission)
            }
            Operation::WithdrawCommission => {
                let ctx = request.context()?;
                self.withdraw_commission(&ctx, transfers).map(Response::Withdrawn)
            }
        }
    }
}
