use std::fmt;

use crate::{DigestError, Result};

/// Final output of an accumulator.
///
/// Width depends on the algorithm that produced it: 8 bytes for xxh64, 32 bytes for
/// SHA-256 and BLAKE3.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self { Self(bytes.into()) }

    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s.trim()).map(Self).map_err(DigestError::from)
    }

    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn to_hex(&self) -> String { hex::encode(&self.0) }

    /// Big-endian value of an exactly 8-byte digest.
    pub fn to_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.0.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// Leading 8 bytes as a big-endian integer, zero padded on the right when shorter.
    pub fn truncate_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        let n = self.0.len().min(8);
        bytes[..n].copy_from_slice(&self.0[..n]);
        u64::from_be_bytes(bytes)
    }

    pub fn matches(&self, expected: &[u8]) -> bool { self.0 == expected }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self { Self(bytes) }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}
