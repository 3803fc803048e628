//! Raw block and transaction shapes as delivered by the base-chain node.
//!
//! These carry no overlay-specific data. The parser consumes them in strict
//! height order and produces the colored [`Block`](crate::block::Block) view.

use crate::hash::{BlockHash, TxId};
use serde::{Deserialize, Serialize};

/// A base-chain block before overlay parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub height: u32,
    /// Unix time in seconds.
    pub time: u64,
    pub hash: BlockHash,
    pub previous_block_hash: BlockHash,
    pub raw_txs: Vec<RawTx>,
}

/// A base-chain transaction before overlay parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTx {
    pub id: TxId,
    pub inputs: Vec<RawTxInput>,
    pub outputs: Vec<RawTxOutput>,
}

/// Reference to a previously created output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxInput {
    pub prev_tx_id: TxId,
    pub prev_output_index: u32,
}

/// An output as seen on the base chain.
///
/// `address` is derived from the locking script by the block source; script
/// interpretation beyond the op-return marker is not an overlay concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxOutput {
    /// Value in base units (satoshis).
    pub value: u64,
    /// Locking script bytes.
    pub script: Vec<u8>,
    pub address: String,
}

impl RawTxOutput {
    /// The op-return marker opcode.
    pub const OP_RETURN: u8 = 0x6a;

    /// Whether the locking script starts with the op-return marker.
    pub fn is_op_return(&self) -> bool {
        self.script.first() == Some(&Self::OP_RETURN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_return_detection() {
        let out = RawTxOutput {
            value: 0,
            script: vec![0x6a, 0x02, 0x10, 0x01],
            address: String::new(),
        };
        assert!(out.is_op_return());

        let out = RawTxOutput {
            value: 100,
            script: vec![0x76, 0xa9],
            address: "addr".into(),
        };
        assert!(!out.is_op_return());

        let empty = RawTxOutput {
            value: 0,
            script: vec![],
            address: String::new(),
        };
        assert!(!empty.is_op_return());
    }
}
