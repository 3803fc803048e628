//! State snapshots — the committed view at a fully-parsed block boundary.
//!
//! A snapshot lets a node hand its state to readers (wallet, UI) or persist
//! it without replaying every block. The hash is computed deterministically
//! from the ordered collections so peers can verify snapshot integrity:
//! blocks by height, outputs by (tx-id, index), params by identifier.

use crate::state::LedgerState;
use agora_crypto::sha256;
use agora_types::{Block, TxOutput, TxOutputKey};
use serde::{Deserialize, Serialize};

/// Height-indexed overrides of one governance parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOverrides {
    /// Persistence-stable parameter identifier.
    pub id: String,
    pub default_value: i64,
    /// Strictly increasing `(height, value)` pairs.
    pub overrides: Vec<(u32, i64)>,
}

/// A deterministic snapshot of the committed overlay state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// SHA-256 over the serialized collections.
    pub hash: [u8; 32],
    pub chain_height: u32,
    pub blocks: Vec<Block>,
    /// All colored-family outputs in (tx-id, index) order.
    pub outputs: Vec<(TxOutputKey, TxOutput)>,
    /// All parameters in identifier order.
    pub params: Vec<ParamOverrides>,
    pub version: u32,
}

impl StateSnapshot {
    /// Capture the current state. `params` must already be sorted by id;
    /// the ledger's own collections iterate in deterministic order.
    pub fn create(state: &LedgerState, params: Vec<ParamOverrides>) -> Self {
        let mut snapshot = Self {
            hash: [0u8; 32],
            chain_height: state.chain_height(),
            blocks: state.blocks().to_vec(),
            outputs: state.outputs().map(|(k, o)| (*k, o.clone())).collect(),
            params,
            version: 1,
        };
        snapshot.hash = snapshot.compute_hash();
        snapshot
    }

    fn compute_hash(&self) -> [u8; 32] {
        let body = (
            self.chain_height,
            &self.blocks,
            &self.outputs,
            &self.params,
            self.version,
        );
        let bytes = bincode::serialize(&body).expect("snapshot serialization should not fail");
        sha256(&bytes)
    }

    /// Verify the snapshot hash matches its contents.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("snapshot serialization should not fail")
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        bincode::deserialize(bytes).map_err(|e| e.to_string())
    }
}
