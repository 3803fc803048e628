//! Synthesizes the genesis tx — the origination of all colored value.
//!
//! The genesis tx is matched by id at the configured height. Its outputs
//! are colored up to the configured total supply; an output straddling the
//! cap keeps only the remaining supply as colored value, and everything
//! after it stays on the base chain.

use agora_types::{GenesisConfig, RawBlock, RawTx, Tx, TxOutput, TxOutputType, TxType};

/// Find and synthesize the genesis tx within a raw block, if present.
pub fn find_genesis_tx(config: &GenesisConfig, raw_block: &RawBlock) -> Option<Tx> {
    if raw_block.height != config.block_height {
        return None;
    }
    raw_block
        .raw_txs
        .iter()
        .find(|raw_tx| raw_tx.id == config.tx_id)
        .map(|raw_tx| parse_genesis_tx(config, raw_tx, raw_block.height))
}

fn parse_genesis_tx(config: &GenesisConfig, raw_tx: &RawTx, block_height: u32) -> Tx {
    let mut remaining = config.total_supply;
    let mut outputs = Vec::with_capacity(raw_tx.outputs.len());

    for (index, raw_out) in raw_tx.outputs.iter().enumerate() {
        let (output_type, value) = if remaining == 0 {
            (TxOutputType::BaseOut, raw_out.value)
        } else if raw_out.value <= remaining {
            remaining -= raw_out.value;
            (TxOutputType::Genesis, raw_out.value)
        } else {
            // Output straddles the supply cap: color only the remainder,
            // the excess stays base-chain and the cap latches.
            let colored = remaining;
            remaining = 0;
            (TxOutputType::Genesis, colored)
        };
        outputs.push(TxOutput {
            tx_id: raw_tx.id,
            index: index as u32,
            value,
            address: raw_out.address.clone(),
            output_type,
            lock_time: None,
            spent: false,
        });
    }

    if remaining > 0 {
        tracing::warn!(
            remaining,
            "genesis outputs cover less than the configured total supply"
        );
    }

    Tx {
        id: raw_tx.id,
        tx_type: TxType::Genesis,
        block_height,
        inputs: Vec::new(),
        outputs,
        burnt_fee: 0,
        op_return: None,
    }
}
