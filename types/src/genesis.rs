//! Genesis configuration — the origination point of the colored overlay.

use crate::hash::TxId;
use serde::{Deserialize, Serialize};

/// Identifies the single genesis transaction of the overlay.
///
/// All colored value traces back to this tx. The configuration is fixed per
/// network and never changes after the first block is processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub tx_id: TxId,
    pub block_height: u32,
    /// Total colored supply minted by the genesis tx, in base units.
    /// Genesis outputs beyond this cap are base-chain outputs.
    pub total_supply: u64,
}

impl GenesisConfig {
    pub fn new(tx_id: TxId, block_height: u32, total_supply: u64) -> Self {
        Self {
            tx_id,
            block_height,
            total_supply,
        }
    }
}
