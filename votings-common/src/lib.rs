//! Shared primitives for the votings workspace: identities, amounts,
//! call context and the ledger error taxonomy.

pub mod address;
pub mod context;
pub mod error;
pub mod units;
pub mod utils;

pub use address::{Address, AddressError};
pub use context::CallContext;
pub use error::{ErrorClass, LedgerError, Result};
pub use units::{format_ether, parse_ether, Amount, UnitsError};
