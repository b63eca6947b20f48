pub mod address;
pub mod errors;

pub use address::Address;
pub use errors::AddressError;
