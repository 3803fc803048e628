//! The committed overlay state: parsed blocks, colored UTXO set, tx indices.
//!
//! All mutation happens on the single ingest task, one block at a time. A
//! block is opened with [`LedgerState::add_empty_block`], filled tx by tx
//! via [`LedgerState::commit_tx`], and is complete when the parser says so;
//! there is no partial-commit path that survives an error.

use crate::error::LedgerError;
use agora_types::{
    Block, GenesisConfig, Tx, TxId, TxOutput, TxOutputKey, TxOutputType, TxType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Height and classification of a committed tx.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMeta {
    pub block_height: u32,
    pub tx_type: TxType,
}

/// Height-addressed chain of parsed blocks plus the colored UTXO set.
///
/// Collections are `BTreeMap`s keyed by [`TxOutputKey`] / [`TxId`] so every
/// iteration over committed state is deterministic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerState {
    genesis: GenesisConfig,
    chain_height: u32,
    blocks: Vec<Block>,
    /// Every colored-family output ever created, including spent ones and
    /// issuance candidates awaiting a vote result.
    outputs: BTreeMap<TxOutputKey, TxOutput>,
    tx_index: BTreeMap<TxId, TxMeta>,
    /// Height at which an accepted compensation request was issued.
    issuance_heights: BTreeMap<TxId, u32>,
    total_burnt: u64,
}

impl LedgerState {
    pub fn new(genesis: GenesisConfig) -> Self {
        Self {
            genesis,
            chain_height: 0,
            blocks: Vec::new(),
            outputs: BTreeMap::new(),
            tx_index: BTreeMap::new(),
            issuance_heights: BTreeMap::new(),
            total_burnt: 0,
        }
    }

    pub fn genesis_config(&self) -> &GenesisConfig {
        &self.genesis
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Height of the last committed block; 0 before the first block.
    pub fn chain_height(&self) -> u32 {
        self.chain_height
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn block_at(&self, height: u32) -> Option<&Block> {
        let first = self.genesis.block_height;
        if height < first {
            return None;
        }
        self.blocks.get((height - first) as usize)
    }

    pub fn has_block_at(&self, height: u32) -> bool {
        self.block_at(height).is_some()
    }

    /// Record a new block height. Heights never regress.
    pub fn on_new_block_height(&mut self, height: u32) {
        self.chain_height = self.chain_height.max(height);
    }

    /// Append a block envelope whose linkage the parser has validated.
    pub fn add_empty_block(&mut self, block: Block) {
        self.on_new_block_height(block.height);
        self.blocks.push(block);
    }

    /// Commit a parsed tx into the current block: spend its colored inputs,
    /// add its colored outputs to the UTXO set, update indices.
    pub fn commit_tx(&mut self, tx: Tx) -> Result<(), LedgerError> {
        for input in &tx.inputs {
            if input.colored_value.is_some() {
                let output = self
                    .outputs
                    .get_mut(&input.spent_output)
                    .ok_or(LedgerError::UnknownOutput(input.spent_output))?;
                output.spent = true;
            }
        }
        for output in &tx.outputs {
            if output.output_type.is_colored()
                || output.output_type == TxOutputType::IssuanceCandidate
            {
                self.outputs.insert(output.key(), output.clone());
            }
        }
        self.total_burnt += tx.burnt_fee;
        self.tx_index.insert(
            tx.id,
            TxMeta {
                block_height: tx.block_height,
                tx_type: tx.tx_type,
            },
        );
        let block = self.blocks.last_mut().ok_or(LedgerError::NoCurrentBlock)?;
        block.txs.push(tx);
        Ok(())
    }

    pub fn tx_meta(&self, tx_id: &TxId) -> Option<TxMeta> {
        self.tx_index.get(tx_id).copied()
    }

    pub fn get_tx(&self, tx_id: &TxId) -> Option<&Tx> {
        let meta = self.tx_index.get(tx_id)?;
        self.block_at(meta.block_height)?
            .txs
            .iter()
            .find(|tx| tx.id == *tx_id)
    }

    /// An unspent colored output, resolvable as a colored input.
    pub fn unspent_colored(&self, key: &TxOutputKey) -> Option<&TxOutput> {
        self.outputs
            .get(key)
            .filter(|o| o.output_type.is_colored() && !o.spent)
    }

    pub fn output(&self, key: &TxOutputKey) -> Option<&TxOutput> {
        self.outputs.get(key)
    }

    /// All tracked outputs in (tx-id, index) order.
    pub fn outputs(&self) -> impl Iterator<Item = (&TxOutputKey, &TxOutput)> {
        self.outputs.iter()
    }

    /// Promote the issuance candidate of an accepted compensation request
    /// to a spendable colored output. Returns the issued amount.
    pub fn apply_issuance(&mut self, tx_id: TxId, height: u32) -> Result<u64, LedgerError> {
        let key = TxOutputKey::new(tx_id, 0);
        let output = self
            .outputs
            .get_mut(&key)
            .filter(|o| o.output_type == TxOutputType::IssuanceCandidate)
            .ok_or(LedgerError::NoIssuanceCandidate(tx_id))?;
        output.output_type = TxOutputType::Issuance;
        self.issuance_heights.insert(tx_id, height);
        tracing::info!(tx = %tx_id, amount = output.value, height, "issuance applied");
        Ok(output.value)
    }

    /// Issued amount and issuance height for a past compensation request.
    pub fn issuance(&self, tx_id: &TxId) -> Option<(u64, u32)> {
        let height = *self.issuance_heights.get(tx_id)?;
        let output = self.outputs.get(&TxOutputKey::new(*tx_id, 0))?;
        (output.output_type == TxOutputType::Issuance).then_some((output.value, height))
    }

    /// Sum of all unspent colored values.
    pub fn unspent_supply(&self) -> u64 {
        self.outputs
            .values()
            .filter(|o| o.output_type.is_colored() && !o.spent)
            .map(|o| o.value)
            .sum()
    }

    /// Total colored value burnt across all committed txs.
    pub fn total_burnt(&self) -> u64 {
        self.total_burnt
    }
}
