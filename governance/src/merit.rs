//! Merit: decaying voting weight earned from past compensation issuance.

use crate::error::GovernanceError;
use agora_types::TxId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One merit claim: proof the voter received an issuance in the past.
///
/// The signature binds the claim to the voter's blind-vote tx; it is
/// carried opaquely here — key handling lives outside the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeritEntry {
    pub issuance_tx_id: TxId,
    pub signature: Vec<u8>,
}

/// Linearly decayed weight of one issuance.
///
/// The decay factor is `max(0, 1 - age / H * 2)` with `H` the configured
/// half-life: full weight at age zero, zero weight once twice the age
/// reaches `H`. Integer form `amount * max(0, H - 2*age) / H`, rounding
/// toward zero.
pub fn decayed_weight(amount: u64, age_blocks: u32, half_life_blocks: u32) -> u64 {
    let half_life = half_life_blocks as u64;
    if half_life == 0 {
        return 0;
    }
    let doubled_age = 2 * age_blocks as u64;
    if doubled_age >= half_life {
        return 0;
    }
    // amount * remaining / half_life, widened to avoid overflow.
    ((amount as u128 * (half_life - doubled_age) as u128) / half_life as u128) as u64
}

/// Deduplicate merit entries by issuance tx id.
///
/// Ages are looked up by the caller; when the same issuance appears twice
/// the entry with the greater age is kept.
pub fn dedup_by_issuance(entries: Vec<(MeritEntry, u32)>) -> Vec<(MeritEntry, u32)> {
    let mut best: BTreeMap<TxId, (MeritEntry, u32)> = BTreeMap::new();
    for (entry, age) in entries {
        match best.get(&entry.issuance_tx_id) {
            Some((_, existing_age)) if *existing_age >= age => {}
            _ => {
                best.insert(entry.issuance_tx_id, (entry, age));
            }
        }
    }
    best.into_values().collect()
}

/// Encode a merit list: `count:u32le`, then per entry the 32-byte issuance
/// tx id, `sig_len:u16le` and the signature bytes.
pub fn serialize_merits(entries: &[MeritEntry]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        bytes.extend_from_slice(entry.issuance_tx_id.as_bytes());
        bytes.extend_from_slice(&(entry.signature.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&entry.signature);
    }
    bytes
}

/// Decode a merit list produced by [`serialize_merits`].
pub fn deserialize_merits(bytes: &[u8]) -> Result<Vec<MeritEntry>, GovernanceError> {
    if bytes.len() < 4 {
        return Err(GovernanceError::MalformedMeritList);
    }
    let count = u32::from_le_bytes(bytes[..4].try_into().expect("4 bytes")) as usize;
    let mut cursor = 4;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        if bytes.len() < cursor + 34 {
            return Err(GovernanceError::MalformedMeritList);
        }
        let issuance_tx_id = TxId::new(bytes[cursor..cursor + 32].try_into().expect("32 bytes"));
        let sig_len =
            u16::from_le_bytes(bytes[cursor + 32..cursor + 34].try_into().expect("2 bytes"))
                as usize;
        cursor += 34;
        if bytes.len() < cursor + sig_len {
            return Err(GovernanceError::MalformedMeritList);
        }
        let signature = bytes[cursor..cursor + sig_len].to_vec();
        cursor += sig_len;
        entries.push(MeritEntry {
            issuance_tx_id,
            signature,
        });
    }
    if cursor != bytes.len() {
        return Err(GovernanceError::MalformedMeritList);
    }
    Ok(entries)
}
