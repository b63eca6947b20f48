use thiserror::Error;

/// Coarse classification of a [`LedgerError`], enough for a caller to tell
/// "does not exist" from "not allowed" from "wrong state" from "bad input".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    NotFound,
    Unauthorized,
    WrongState,
    InvalidArgument,
    /// Failures outside the state machine: storage, transfers, corruption.
    Environment,
}

/// Every way a ledger operation can fail.
///
/// A returned error always means no state changed and no value moved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller is not the ledger owner for an owner-only operation.
    #[error("Unauthorized: {0} is not the ledger owner")]
    Unauthorized(String),

    /// The referenced voting does not exist, or no usable id was given.
    #[error("Voting not found: {0}")]
    NotFound(String),

    /// The voting has already been closed.
    #[error("Voting {0} is already completed")]
    AlreadyCompleted(u64),

    /// A stake was sent without value.
    #[error("Invalid stake: a vote must carry a nonzero value")]
    InvalidStake,

    /// The candidate is malformed or is the caller.
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    #[error("Duplicate vote: {voter} already voted in voting {id}")]
    DuplicateVote { id: u64, voter: String },

    #[error("Voting {0} has no budget and cannot be closed")]
    EmptyBudget(u64),

    /// The maturation period has not elapsed since the voting was created.
    #[error("Voting {id} cannot be closed for another {remaining} seconds")]
    TooEarly { id: u64, remaining: u64 },

    #[error("No commission to withdraw")]
    NothingToWithdraw,

    /// The caller identity itself is malformed.
    #[error("Invalid caller: {0}")]
    InvalidCaller(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// The value-transfer port refused the payout.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A loaded ledger does not satisfy its invariants.
    #[error("Corrupted ledger state: {0}")]
    Corrupted(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorClass {
        match self {
            LedgerError::NotFound(_) => ErrorClass::NotFound,
            LedgerError::Unauthorized(_) => ErrorClass::Unauthorized,
            LedgerError::AlreadyCompleted(_)
            | LedgerError::DuplicateVote { .. }
            | LedgerError::EmptyBudget(_)
            | LedgerError::TooEarly { .. }
            | LedgerError::NothingToWithdraw => ErrorClass::WrongState,
            LedgerError::InvalidStake
            | LedgerError::InvalidCandidate(_)
            | LedgerError::InvalidCaller(_)
            | LedgerError::Overflow(_) => ErrorClass::InvalidArgument,
            LedgerError::TransferFailed(_)
            | LedgerError::Storage(_)
            | LedgerError::Corrupted(_) => ErrorClass::Environment,
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
