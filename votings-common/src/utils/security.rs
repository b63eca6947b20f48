use rand::{rngs::OsRng, RngCore};

/// Returns 32 bytes of OS randomness, suitable as an Ed25519 signing key seed.
pub fn generate_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    seed
}
