// src/services/fingerprint.rs

//! Content fingerprinting.
//!
//! The digest is taken over the raw extracted bytes with no
//! normalization. Change detection is digest equality only, so the
//! hash has to be deterministic and stable across runs; collision
//! resistance matters, cryptographic strength does not.

use sha2::{Digest as _, Sha256};

use crate::models::Digest;

/// Fingerprint a byte sequence into a fixed-width hex digest.
pub fn fingerprint(content: &[u8]) -> Digest {
    Digest::from_hex(hex::encode(Sha256::digest(content)))
}
