//! Content fingerprints for generated assets

use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 hash of an asset file's bytes.
///
/// Logged when the runner writes an image or audio clip so repeated
/// generations of the same entity can be told apart in run logs.
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// e.g. "sha256:abcdef..."
    pub fn to_prefixed_hex(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_hash() {
        assert_eq!(
            ContentHash::from_bytes(b"RIFF....WAVE"),
            ContentHash::from_bytes(b"RIFF....WAVE")
        );
        assert_ne!(
            ContentHash::from_bytes(b"image-a"),
            ContentHash::from_bytes(b"image-b")
        );
    }

    #[test]
    fn test_hex_forms() {
        let h = ContentHash::from_bytes(b"");
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(
            h.to_prefixed_hex(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(format!("{}", h), "e3b0c44298fc1c14");
    }
}
