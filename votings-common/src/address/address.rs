use ed25519_dalek::{SigningKey, VerifyingKey};
use bech32::{convert_bits, decode, encode, u5, FromBase32, Variant};
use serde::{Serialize, Deserialize};

use super::errors::AddressError;

/// Prefix of addresses derived from an exposed public key.
pub const EXPOSED_PREFIX: &str = "nbex";
/// Prefix of addresses whose owner keeps the profile hidden.
pub const HIDDEN_PREFIX: &str = "nbhd";

/// A caller or candidate identity: the bech32m encoding of an Ed25519 verifying key.
///
/// Only constructible through validation, so holding an `Address` means the
/// string decodes to a valid 32-byte key under a known prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::public_key_from_str(&s)?;
        Ok(Address(s))
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.to_string())
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl std::ops::Deref for Address {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Address {
    /// Returns whether the given string is a valid address.
    pub fn is_valid(address: &str) -> bool {
        Self::public_key_from_str(address).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_hidden(&self) -> bool {
        self.0.starts_with(HIDDEN_PREFIX)
    }

    /// Derives the exposed (`nbex`) address of a verifying key.
    pub fn from_public_key(public_key: &VerifyingKey) -> Result<Self, AddressError> {
        Self::address_from_pk(public_key, EXPOSED_PREFIX).map(Address)
    }

    /// Derives the exposed address of the key generated from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, AddressError> {
        let signing_key = SigningKey::from_bytes(seed);
        Self::from_public_key(&signing_key.verifying_key())
    }

    /// Extracts the public key from a valid address.
    pub fn public_key_from_str(address: &str) -> Result<VerifyingKey, AddressError> {
        let (hrp, data, variant) = decode(address)
            .map_err(|e| AddressError::InvalidPublicKey(e.to_string()))?;

        if hrp != EXPOSED_PREFIX && hrp != HIDDEN_PREFIX {
            return Err(AddressError::UnknownPrefix(hrp));
        }
        if variant != Variant::Bech32m {
            return Err(AddressError::InvalidPublicKey(format!("Invalid address: {}", address)));
        }

        let bytes = Vec::<u8>::from_base32(&data)?;

        let bytes_array: [u8; 32] = bytes.as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidPublicKeyLength(bytes.len()))?;

        Ok(VerifyingKey::from_bytes(&bytes_array)?)
    }

    /// Converts a `VerifyingKey` into a bech32m-encoded address under `prefix`.
    ///
    /// The 32-byte key is regrouped into 5-bit chunks before encoding.
    pub fn address_from_pk(public_key: &VerifyingKey, prefix: &str) -> Result<String, AddressError> {
        let bytes = public_key.to_bytes();

        let five_bit = convert_bits(&bytes, 8, 5, true)?
            .into_iter()
            .map(u5::try_from_u8)
            .collect::<Result<Vec<u5>, _>>()?;

        encode(prefix, five_bit, Variant::Bech32m)
            .map_err(|_| AddressError::EncodingFailed)
    }
}
