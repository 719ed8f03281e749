//! Content addressing for compiled artifacts.
//!
//! Deployment consumes the artifact file verbatim, so the identity of an
//! artifact is the BLAKE3 hash of its canonical JSON bytes. Compiling the
//! same tree twice must produce the same hash.

use std::fmt;

/// Hex digits shown by the short form (48 bits).
const SHORT_HEX_DIGITS: usize = 12;

/// BLAKE3 hash of an artifact's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// Leading hex digits, enough to tell artifacts apart in logs.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_HEX_DIGITS);
        hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.short())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHash").field(&self.to_hex()).finish()
    }
}
