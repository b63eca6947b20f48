//! Paid voting rounds with escrowed stakes and an owner commission.
//!
//! [`VotingLedger`] is the state machine; [`SharedLedger`] puts it behind a
//! lock for concurrent callers, and [`Request`] lets untyped input drive it.

pub mod commission;
pub mod constants;
pub mod events;
pub mod ledger;
pub mod request;
pub mod round;
pub mod shared;
pub mod storage;
pub mod transfer;

pub use commission::{commission_for, CommissionAccount};
pub use constants::{COMMISSION_PERCENT, MATURATION_PERIOD_SECS};
pub use events::LedgerEvent;
pub use ledger::VotingLedger;
pub use request::{Operation, Request, Response};
pub use round::{RoundSnapshot, RoundStatus, VotingId, VotingRound};
pub use shared::SharedLedger;
pub use transfer::{InMemoryTransfers, Payout, TransferError, ValueTransfer};
