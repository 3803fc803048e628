//! Classifies a raw tx's outputs and derives its overlay tx type.
//!
//! The classifier walks outputs in index order against the running colored
//! input value. An under-funded output latches the tx: it and every later
//! output become base-chain outputs even if a later one would fit the
//! remaining value — positional semantics are deliberate.

use crate::op_return;
use agora_governance::{Param, ParamRegistry};
use agora_ledger::LedgerState;
use agora_types::{
    OpReturnData, RawTx, Tx, TxInput, TxOutput, TxOutputKey, TxOutputType, TxType,
};

/// Parses individual raw txs against committed state.
pub struct TxParser<'a> {
    registry: &'a ParamRegistry,
}

impl<'a> TxParser<'a> {
    pub fn new(registry: &'a ParamRegistry) -> Self {
        Self { registry }
    }

    /// Parse one raw tx. Returns `None` when the tx has no colored inputs —
    /// it is not an overlay tx and leaves no trace in the state.
    pub fn parse(&self, raw_tx: &RawTx, block_height: u32, state: &LedgerState) -> Option<Tx> {
        let inputs = resolve_inputs(raw_tx, state);
        let available: u64 = inputs.iter().filter_map(|i| i.colored_value).sum();
        if available == 0 {
            return None;
        }

        let (intent, decode_failed) = decode_intent(raw_tx);
        let mut classified = self.classify_outputs(raw_tx, block_height, state, &inputs, intent, available);
        classified.irregular |= decode_failed;

        let tx_type = self.derive_tx_type(block_height, state, &inputs, intent, &classified);

        if tx_type == TxType::Irregular {
            tracing::warn!(tx = %raw_tx.id, height = block_height, "irregular tx, colored input value burnt");
            return Some(Tx {
                id: raw_tx.id,
                tx_type,
                block_height,
                inputs,
                outputs: burn_outputs(raw_tx),
                burnt_fee: available,
                op_return: intent,
            });
        }

        Some(Tx {
            id: raw_tx.id,
            tx_type,
            block_height,
            inputs,
            outputs: classified.outputs,
            burnt_fee: classified.remaining,
            op_return: intent,
        })
    }

    fn classify_outputs(
        &self,
        raw_tx: &RawTx,
        block_height: u32,
        state: &LedgerState,
        inputs: &[TxInput],
        intent: Option<OpReturnData>,
        mut available: u64,
    ) -> ClassifiedOutputs {
        let mut outputs = Vec::with_capacity(raw_tx.outputs.len());
        let mut irregular = false;
        let mut latched = false;
        let last_index = raw_tx.outputs.len().saturating_sub(1);

        for (index, raw_out) in raw_tx.outputs.iter().enumerate() {
            let idx = index as u32;

            if raw_out.is_op_return() {
                let output_type = if index == last_index {
                    op_return_output_type(intent)
                } else {
                    // The marker output must be trailing.
                    irregular = true;
                    TxOutputType::OpReturnOther
                };
                outputs.push(make_output(raw_tx, idx, raw_out.value, output_type, None));
                continue;
            }

            if matches!(intent, Some(OpReturnData::CompRequest { .. })) && index == 0 {
                outputs.push(make_output(
                    raw_tx,
                    idx,
                    raw_out.value,
                    TxOutputType::IssuanceCandidate,
                    None,
                ));
                continue;
            }

            if !latched && available >= raw_out.value {
                let (output_type, lock_time) = match intent {
                    Some(OpReturnData::Lockup { lock_time }) if index == 0 => {
                        if !self.lock_time_in_bounds(lock_time, block_height) {
                            irregular = true;
                        }
                        (TxOutputType::Lockup, Some(lock_time))
                    }
                    Some(OpReturnData::Unlock { lockup_tx_id }) if index == 0 => {
                        if !spends_lockup(inputs, lockup_tx_id, state) {
                            irregular = true;
                        }
                        (TxOutputType::Unlock, None)
                    }
                    _ => (TxOutputType::Colored, None),
                };
                available -= raw_out.value;
                outputs.push(make_output(raw_tx, idx, raw_out.value, output_type, lock_time));
            } else {
                latched = true;
                available = 0;
                outputs.push(make_output(raw_tx, idx, raw_out.value, TxOutputType::BaseOut, None));
            }
        }

        ClassifiedOutputs {
            outputs,
            remaining: available,
            irregular,
        }
    }

    fn lock_time_in_bounds(&self, lock_time: u32, block_height: u32) -> bool {
        let min = self.registry.value(Param::LockTimeMin, block_height).max(1) as u32;
        let max = self.registry.value(Param::LockTimeMax, block_height).max(0) as u32;
        lock_time >= min && lock_time <= max
    }

    fn derive_tx_type(
        &self,
        block_height: u32,
        state: &LedgerState,
        inputs: &[TxInput],
        intent: Option<OpReturnData>,
        classified: &ClassifiedOutputs,
    ) -> TxType {
        if classified.irregular {
            return TxType::Irregular;
        }
        let burnt = classified.remaining;
        let colored_found = classified
            .outputs
            .iter()
            .any(|o| o.output_type.is_colored());
        let first_output_type = classified.outputs.first().map(|o| o.output_type);

        match intent {
            None => {
                if colored_found {
                    if burnt > 0 {
                        TxType::PayTradeFee
                    } else {
                        TxType::TransferColored
                    }
                } else if burnt > 0 {
                    TxType::PayTradeFee
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::Proposal { .. }) => {
                if burnt >= self.fee(Param::ProposalFee, block_height) {
                    TxType::Proposal
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::CompRequest { .. }) => {
                if burnt >= self.fee(Param::ProposalFee, block_height) {
                    TxType::CompensationRequest
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::AssetRemoval { .. }) => {
                if burnt >= self.fee(Param::ProposalFee, block_height) {
                    TxType::AssetRemoval
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::BlindVote { .. }) => {
                let stake_ok = first_output_type == Some(TxOutputType::Colored);
                if stake_ok && burnt >= self.fee(Param::BlindVoteFee, block_height) {
                    TxType::BlindVote
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::VoteReveal { .. }) => {
                let spends_blind_vote_stake = inputs
                    .first()
                    .filter(|i| i.colored_value.is_some() && i.spent_output.index == 0)
                    .and_then(|i| state.tx_meta(&i.spent_output.tx_id))
                    .map(|meta| meta.tx_type == TxType::BlindVote)
                    .unwrap_or(false);
                if spends_blind_vote_stake {
                    TxType::VoteReveal
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::Lockup { .. }) => {
                if first_output_type == Some(TxOutputType::Lockup) {
                    TxType::Lockup
                } else {
                    TxType::Irregular
                }
            }
            Some(OpReturnData::Unlock { .. }) => {
                if first_output_type == Some(TxOutputType::Unlock) {
                    TxType::Unlock
                } else {
                    TxType::Irregular
                }
            }
        }
    }

    fn fee(&self, param: Param, block_height: u32) -> u64 {
        self.registry.value(param, block_height).max(0) as u64
    }
}

struct ClassifiedOutputs {
    outputs: Vec<TxOutput>,
    /// Colored input value left after the walk — the burnt fee.
    remaining: u64,
    irregular: bool,
}

fn resolve_inputs(raw_tx: &RawTx, state: &LedgerState) -> Vec<TxInput> {
    raw_tx
        .inputs
        .iter()
        .map(|raw_in| {
            let key = TxOutputKey::new(raw_in.prev_tx_id, raw_in.prev_output_index);
            TxInput {
                spent_output: key,
                colored_value: state.unspent_colored(&key).map(|o| o.value),
            }
        })
        .collect()
}

fn decode_intent(raw_tx: &RawTx) -> (Option<OpReturnData>, bool) {
    let Some(last) = raw_tx.outputs.last().filter(|o| o.is_op_return()) else {
        return (None, false);
    };
    match op_return::decode(&last.script) {
        Ok(intent) => (Some(intent), false),
        Err(error) => {
            tracing::warn!(tx = %raw_tx.id, %error, "op-return decode failed");
            (None, true)
        }
    }
}

fn op_return_output_type(intent: Option<OpReturnData>) -> TxOutputType {
    match intent {
        Some(OpReturnData::Proposal { .. }) => TxOutputType::ProposalOpReturn,
        Some(OpReturnData::CompRequest { .. }) => TxOutputType::CompRequestOpReturn,
        Some(OpReturnData::BlindVote { .. }) => TxOutputType::BlindVoteOpReturn,
        Some(OpReturnData::VoteReveal { .. }) => TxOutputType::VoteRevealOpReturn,
        Some(OpReturnData::Lockup { .. }) => TxOutputType::LockupOpReturn,
        Some(OpReturnData::Unlock { .. }) => TxOutputType::UnlockOpReturn,
        Some(OpReturnData::AssetRemoval { .. }) => TxOutputType::AssetRemovalOpReturn,
        None => TxOutputType::OpReturnOther,
    }
}

fn spends_lockup(
    inputs: &[TxInput],
    lockup_tx_id: agora_types::TxId,
    state: &LedgerState,
) -> bool {
    let expected = TxOutputKey::new(lockup_tx_id, 0);
    inputs
        .first()
        .filter(|i| i.spent_output == expected && i.colored_value.is_some())
        .and_then(|_| state.output(&expected))
        .map(|o| o.output_type == TxOutputType::Lockup)
        .unwrap_or(false)
}

fn make_output(
    raw_tx: &RawTx,
    index: u32,
    value: u64,
    output_type: TxOutputType,
    lock_time: Option<u32>,
) -> TxOutput {
    TxOutput {
        tx_id: raw_tx.id,
        index,
        value,
        address: raw_tx.outputs[index as usize].address.clone(),
        output_type,
        lock_time,
        spent: false,
    }
}

/// Outputs of an irregular tx: value outputs fall back to the base chain,
/// marker outputs stay informational. No colored value survives.
fn burn_outputs(raw_tx: &RawTx) -> Vec<TxOutput> {
    raw_tx
        .outputs
        .iter()
        .enumerate()
        .map(|(index, raw_out)| {
            let output_type = if raw_out.is_op_return() {
                TxOutputType::OpReturnOther
            } else {
                TxOutputType::BaseOut
            };
            make_output(raw_tx, index as u32, raw_out.value, output_type, None)
        })
        .collect()
}
