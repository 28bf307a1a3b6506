use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Length in bytes of every payload fingerprint.
pub const DIGEST_LEN: usize = 32;

/// Fixed-length integrity fingerprint of a payload.
///
/// Identical payload bytes always map to the same digest. It detects payload
/// corruption and replay; it says nothing about who produced the payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(#[serde(with = "hex::serde")] pub [u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Computes the SHA-256 digest of the given data.
pub fn digest(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest(hasher.finalize().into())
}

/// Canonical bytes of a report payload: the token count, little endian.
///
/// The sender and round are deliberately outside the digested payload; only
/// the value being voted on is fingerprinted.
pub fn report_payload(token_count: u32) -> [u8; 4] {
    token_count.to_le_bytes()
}

/// Digest over the canonical payload of a declared token count.
pub fn digest_report_payload(token_count: u32) -> Digest {
    digest(&report_payload(token_count))
}
