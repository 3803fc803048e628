//! The parsed block: a raw block restricted to overlay-relevant txs.

use crate::hash::BlockHash;
use crate::raw::RawBlock;
use crate::tx::Tx;
use serde::{Deserialize, Serialize};

/// Parsed view of a [`RawBlock`] containing only colored or
/// governance-relevant transactions. Header fields are identical to the raw
/// block's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u32,
    /// Unix time in seconds.
    pub time: u64,
    pub hash: BlockHash,
    pub previous_block_hash: BlockHash,
    pub txs: Vec<Tx>,
}

impl Block {
    /// Create the empty envelope for a raw block; txs are filled in by the
    /// parser.
    pub fn from_header(raw: &RawBlock) -> Self {
        Self {
            height: raw.height,
            time: raw.time,
            hash: raw.hash,
            previous_block_hash: raw.previous_block_hash,
            txs: Vec::new(),
        }
    }
}
