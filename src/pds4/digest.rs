//! MD5 checksum computation.
//!
//! Every label and every serialized inventory is checksummed with MD5 and
//! compared/recorded as lowercase hex.

use digest::Digest;
use md5::Md5;

/// Lowercase hex-encoded MD5 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexDigest(String);

impl HexDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HexDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MD5 of a byte slice, e.g. label file contents or a serialized inventory.
pub fn md5_hex(bytes: &[u8]) -> HexDigest {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    HexDigest(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_of_known_input() {
        // echo -n "hello" | md5sum
        let digest = md5_hex(b"hello");
        assert_eq!(digest.as_str(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn md5_is_stable_across_calls() {
        let bytes = b"<Product_Bundle/>";
        assert_eq!(md5_hex(bytes), md5_hex(bytes));
    }
}
