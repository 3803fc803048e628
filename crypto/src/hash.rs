//! SHA-256 and RIPEMD-160(SHA-256) payload digests.
//!
//! Op-return payloads commit to a 20-byte `hash160` digest: RIPEMD-160 over
//! the SHA-256 of the payload bytes.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute RIPEMD-160(SHA-256(data)) — the 20-byte digest carried in
/// op-return payloads and blind-vote commitments.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = sha256(data);
    let mut hasher = Ripemd160::new();
    hasher.update(sha);
    let result = hasher.finalize();
    let mut output = [0u8; 20];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_deterministic() {
        let h1 = sha256(b"hello agora");
        let h2 = sha256(b"hello agora");
        assert_eq!(h1, h2);
    }

    #[test]
    fn sha256_different_inputs() {
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn sha256_multi_equivalent() {
        let single = sha256(b"helloworld");
        let multi = sha256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        let h = sha256(b"abc");
        assert_eq!(
            h[..4],
            [0xba, 0x78, 0x16, 0xbf],
            "first bytes of SHA-256(\"abc\")"
        );
    }

    #[test]
    fn hash160_is_20_bytes_and_deterministic() {
        let h1 = hash160(b"payload");
        let h2 = hash160(b"payload");
        assert_eq!(h1, h2);
        assert_ne!(h1, [0u8; 20]);
    }

    #[test]
    fn hash160_differs_from_truncated_sha() {
        let payload = b"payload";
        let sha = sha256(payload);
        let h160 = hash160(payload);
        assert_ne!(&sha[..20], &h160[..]);
    }
}
