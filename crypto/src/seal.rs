//! Ballot sealing — AES-128-CBC with PKCS#7 padding.
//!
//! A blind vote carries its ballot list sealed under a 128-bit key the voter
//! reveals later. The 16-byte IV is prepended to the ciphertext so the
//! sealed bytes are self-contained; the commitment published on chain is
//! `hash160` over exactly these bytes.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use thiserror::Error;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Length of the symmetric key in bytes.
pub const KEY_LEN: usize = 16;
/// Length of the IV / cipher block in bytes.
pub const BLOCK_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    /// Sealed bytes are too short or not block-aligned.
    #[error("sealed payload malformed: {len} bytes")]
    Malformed { len: usize },

    /// Padding check failed — wrong key or corrupted ciphertext.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Seal `plaintext` under `key` with the given IV.
///
/// The caller supplies the IV (drawn from its own randomness source); the
/// core never generates randomness, which keeps replay deterministic.
pub fn seal(plaintext: &[u8], key: &[u8; KEY_LEN], iv: &[u8; BLOCK_LEN]) -> Vec<u8> {
    let ciphertext =
        Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mut sealed = Vec::with_capacity(BLOCK_LEN + ciphertext.len());
    sealed.extend_from_slice(iv);
    sealed.extend_from_slice(&ciphertext);
    sealed
}

/// Open a sealed payload with the revealed key.
pub fn unseal(sealed: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>, SealError> {
    if sealed.len() < 2 * BLOCK_LEN || sealed.len() % BLOCK_LEN != 0 {
        return Err(SealError::Malformed { len: sealed.len() });
    }
    let (iv, ciphertext) = sealed.split_at(BLOCK_LEN);
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| SealError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [0x11; 16];
    const IV: [u8; 16] = [0x22; 16];

    #[test]
    fn seal_unseal_roundtrip() {
        let plaintext = b"ballot list bytes";
        let sealed = seal(plaintext, &KEY, &IV);
        assert_eq!(&sealed[..16], &IV);
        assert_eq!(sealed.len() % 16, 0);

        let opened = unseal(&sealed, &KEY).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn seal_is_deterministic_for_fixed_iv() {
        let sealed1 = seal(b"data", &KEY, &IV);
        let sealed2 = seal(b"data", &KEY, &IV);
        assert_eq!(sealed1, sealed2);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal(b"some longer ballot payload data", &KEY, &IV);
        let wrong = [0x33; 16];
        // With overwhelming probability PKCS#7 padding is invalid under the
        // wrong key for this payload.
        assert_eq!(unseal(&sealed, &wrong), Err(SealError::DecryptionFailed));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let sealed = seal(b"data", &KEY, &IV);
        assert_eq!(
            unseal(&sealed[..16], &KEY),
            Err(SealError::Malformed { len: 16 })
        );
        assert_eq!(
            unseal(&sealed[..sealed.len() - 1], &KEY),
            Err(SealError::Malformed {
                len: sealed.len() - 1
            })
        );
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let sealed = seal(b"", &KEY, &IV);
        // One full padding block after the IV.
        assert_eq!(sealed.len(), 32);
        assert_eq!(unseal(&sealed, &KEY).unwrap(), Vec::<u8>::new());
    }
}
