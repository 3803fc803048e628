//! Cryptographic primitives for the agora governance overlay.
//!
//! - **SHA-256** and **RIPEMD-160(SHA-256)** for payload digests and
//!   blind-vote commitments
//! - **AES-128-CBC** (PKCS#7) for sealing ballot and merit lists until the
//!   vote-reveal phase

pub mod hash;
pub mod seal;

pub use hash::{hash160, sha256, sha256_multi};
pub use seal::{seal, unseal, SealError, BLOCK_LEN, KEY_LEN};
