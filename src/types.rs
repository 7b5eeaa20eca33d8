//! Core types used throughout Accord

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of whoever sent an offer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Buyer,
    Seller,
    Mediator,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Party::Buyer => "Buyer",
            Party::Seller => "Seller",
            Party::Mediator => "Mediator",
        };
        write!(f, "{}", name)
    }
}

/// Blake2b 256-bit hash wrapper
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Hash a sequence of byte chunks, each terminated by a newline
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Blake2b512::new();
        for part in parts {
            hasher.update(part);
            hasher.update(b"\n");
        }
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result[..32]);
        Hash(hash)
    }

    /// Get hash as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
