//! Blind votes and their reveals.
//!
//! A blind vote publishes `hash160(ciphertext)` of the sealed ballot list
//! on chain while the ciphertext itself travels through gossip. The reveal
//! tx later discloses the 128-bit key, spending the blind vote's stake
//! output so the pair is linked by the chain itself.

use agora_crypto::hash160;
use agora_types::{OpReturnData, Tx, TxId};
use serde::{Deserialize, Serialize};

/// A blind vote: on-chain stake plus the off-chain sealed payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindVote {
    /// The confirmed blind-vote tx.
    pub tx_id: TxId,
    /// Stake locked in the tx's first output, in base units.
    pub stake: u64,
    /// Sealed ballot list (IV + AES-128-CBC ciphertext).
    pub encrypted_ballots: Vec<u8>,
    /// Sealed merit list.
    pub encrypted_merits: Vec<u8>,
}

impl BlindVote {
    /// The commitment these sealed ballots produce. Must equal the 20-byte
    /// digest in the blind-vote tx's op-return output.
    pub fn commitment(&self) -> [u8; 20] {
        hash160(&self.encrypted_ballots)
    }
}

/// A vote reveal, reconstructed entirely from its on-chain tx.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReveal {
    pub tx_id: TxId,
    /// The blind vote whose stake output this reveal spends.
    pub blind_vote_tx_id: TxId,
    pub secret_key: [u8; 16],
    pub merit_digest: [u8; 20],
}

impl VoteReveal {
    /// Extract a reveal from a confirmed `VoteReveal` tx. The first input
    /// spends the blind vote's stake output, which identifies the pair.
    pub fn from_tx(tx: &Tx) -> Option<VoteReveal> {
        let (merit_digest, secret_key) = match tx.op_return {
            Some(OpReturnData::VoteReveal {
                merit_digest,
                secret_key,
            }) => (merit_digest, secret_key),
            _ => return None,
        };
        let stake_input = tx.inputs.first()?;
        Some(VoteReveal {
            tx_id: tx.id,
            blind_vote_tx_id: stake_input.spent_output.tx_id,
            secret_key,
            merit_digest,
        })
    }
}
