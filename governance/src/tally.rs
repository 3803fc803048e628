//! The vote tally engine, run once per cycle at the first Result block.
//!
//! Determinism: blind votes are processed in ascending vote-tx-id order and
//! proposals in ascending proposal-tx-id order; every rejected pair is
//! logged with its reason and nothing else depends on wall time.

use crate::ballot::{deserialize_ballots, Ballot, Vote};
use crate::merit::{decayed_weight, dedup_by_issuance, deserialize_merits};
use crate::params::{Param, ParamRegistry};
use crate::store::GovernanceStore;
use agora_crypto::unseal;
use agora_ledger::LedgerState;
use agora_types::{
    Cycle, CycleResult, Decision, DecisionEffect, OpReturnData, Phase, TxId, VoteResult,
};

use crate::proposal::Proposal;

/// A blind vote that survived reveal matching, commitment verification and
/// decryption.
struct ValidVote {
    tx_id: TxId,
    stake: u64,
    /// Stake plus decayed merit.
    weight: u64,
    ballots: Vec<Ballot>,
}

/// Tally all proposals of `cycle` against its revealed blind votes.
pub fn tally_cycle(
    cycle: &Cycle,
    state: &LedgerState,
    registry: &ParamRegistry,
    store: &GovernanceStore,
) -> CycleResult {
    let votes = collect_valid_votes(cycle, state, registry, store);

    let mut decisions = Vec::new();
    for proposal in store.proposals_in_cycle(cycle.index) {
        let decision = decide(proposal, &votes, cycle, registry);
        tracing::info!(
            proposal = %decision.proposal_tx_id,
            result = ?decision.result,
            accept = decision.accept_weight,
            reject = decision.reject_weight,
            stake = decision.total_stake,
            "proposal decided"
        );
        decisions.push(decision);
    }

    CycleResult {
        cycle_index: cycle.index,
        decisions,
    }
}

/// Pair blind votes with reveals, verify commitments, decrypt, weigh merit.
fn collect_valid_votes(
    cycle: &Cycle,
    state: &LedgerState,
    registry: &ParamRegistry,
    store: &GovernanceStore,
) -> Vec<ValidVote> {
    let half_life = registry
        .value(Param::MeritHalfLifeBlocks, cycle.first_block)
        .max(0) as u32;

    let mut votes = Vec::new();
    for blind_vote in store.blind_votes() {
        let tx_id = blind_vote.tx_id;
        let Some(meta) = state.tx_meta(&tx_id) else {
            continue;
        };
        if cycle.phase_for(meta.block_height) != Phase::BlindVote {
            continue;
        }

        let Some(reveal) = store.reveal_for(&tx_id) else {
            tracing::debug!(blind_vote = %tx_id, "no reveal, vote not counted");
            continue;
        };
        let reveal_height = match state.tx_meta(&reveal.tx_id) {
            Some(meta) => meta.block_height,
            None => continue,
        };
        if cycle.phase_for(reveal_height) != Phase::VoteReveal {
            tracing::warn!(
                blind_vote = %tx_id,
                reveal = %reveal.tx_id,
                height = reveal_height,
                "reveal outside the vote-reveal phase, pair discarded"
            );
            continue;
        }

        let on_chain_commitment = state.get_tx(&tx_id).and_then(|tx| match tx.op_return {
            Some(OpReturnData::BlindVote { commitment }) => Some(commitment),
            _ => None,
        });
        if on_chain_commitment != Some(blind_vote.commitment()) {
            tracing::warn!(blind_vote = %tx_id, "commitment mismatch, pair discarded");
            continue;
        }

        let ballots = match unseal(&blind_vote.encrypted_ballots, &reveal.secret_key)
            .map_err(|e| e.to_string())
            .and_then(|plain| deserialize_ballots(&plain).map_err(|e| e.to_string()))
        {
            Ok(ballots) => ballots,
            Err(reason) => {
                tracing::warn!(blind_vote = %tx_id, reason, "ballot decryption failed, vote disqualified");
                continue;
            }
        };

        let merit_weight = match merit_weight_of(blind_vote, reveal.secret_key, cycle, state, half_life)
        {
            Ok(weight) => weight,
            Err(reason) => {
                tracing::warn!(blind_vote = %tx_id, reason, "merit decryption failed, vote disqualified");
                continue;
            }
        };

        votes.push(ValidVote {
            tx_id,
            stake: blind_vote.stake,
            weight: blind_vote.stake + merit_weight,
            ballots,
        });
    }
    // BTreeMap iteration already yields ascending tx ids; keep the order
    // explicit for the tally below.
    votes.sort_by_key(|v| v.tx_id);
    votes
}

/// Total decayed merit sealed into a blind vote. An empty sealed payload
/// means the voter claims no merit.
fn merit_weight_of(
    blind_vote: &crate::blind_vote::BlindVote,
    key: [u8; 16],
    cycle: &Cycle,
    state: &LedgerState,
    half_life: u32,
) -> Result<u64, String> {
    if blind_vote.encrypted_merits.is_empty() {
        return Ok(0);
    }
    let plain = unseal(&blind_vote.encrypted_merits, &key).map_err(|e| e.to_string())?;
    let entries = deserialize_merits(&plain).map_err(|e| e.to_string())?;

    let mut with_ages = Vec::new();
    for entry in entries {
        match state.issuance(&entry.issuance_tx_id) {
            Some((_, issued_height)) => {
                let age = cycle.first_block.saturating_sub(issued_height);
                with_ages.push((entry, age));
            }
            None => {
                tracing::debug!(issuance = %entry.issuance_tx_id, "unknown issuance, merit entry ignored");
            }
        }
    }

    let mut total = 0u64;
    for (entry, age) in dedup_by_issuance(with_ages) {
        let (amount, _) = state
            .issuance(&entry.issuance_tx_id)
            .expect("checked above");
        total += decayed_weight(amount, age, half_life);
    }
    Ok(total)
}

/// Quorum then threshold, integer math rounding toward zero.
fn decide(
    proposal: &Proposal,
    votes: &[ValidVote],
    cycle: &Cycle,
    registry: &ParamRegistry,
) -> Decision {
    let proposal_tx_id = proposal.tx_id();
    let mut accept_weight = 0u64;
    let mut reject_weight = 0u64;
    let mut total_stake = 0u64;

    for vote in votes {
        let Some(ballot) = vote
            .ballots
            .iter()
            .find(|b| b.proposal_tx_id == proposal_tx_id)
        else {
            continue;
        };
        total_stake += vote.stake;
        match ballot.vote {
            Some(Vote::Accept) => accept_weight += vote.weight,
            Some(Vote::Reject) => reject_weight += vote.weight,
            Some(Vote::Ignore) | None => {}
        }
    }

    let quorum = registry
        .value(proposal.quorum_param(), cycle.first_block)
        .max(0) as u64;
    let threshold = registry
        .value(proposal.threshold_param(), cycle.first_block)
        .max(0) as u64;

    let result = if total_stake < quorum {
        VoteResult::RejectedQuorum
    } else {
        let contested = accept_weight + reject_weight;
        let ratio = if contested == 0 {
            0
        } else {
            (accept_weight as u128 * 10_000 / contested as u128) as u64
        };
        if ratio >= threshold {
            VoteResult::Accepted
        } else {
            VoteResult::RejectedThreshold
        }
    };

    let effect = (result == VoteResult::Accepted).then(|| effect_of(proposal));

    Decision {
        proposal_tx_id,
        result,
        accept_weight,
        reject_weight,
        total_stake,
        effect: effect.flatten(),
    }
}

fn effect_of(proposal: &Proposal) -> Option<DecisionEffect> {
    match proposal {
        Proposal::Compensation {
            common,
            requested_amount,
            address,
        } => Some(DecisionEffect::Issuance {
            tx_id: common.tx_id,
            amount: *requested_amount,
            address: address.clone(),
        }),
        Proposal::ChangeParam {
            param, new_value, ..
        } => Some(DecisionEffect::ParamChange {
            param_id: param.id().to_string(),
            value: *new_value,
        }),
        Proposal::RemoveAsset { asset_ticker, .. } => Some(DecisionEffect::AssetRemoval {
            asset_ticker: asset_ticker.clone(),
        }),
        Proposal::BurnBond { bond_id, .. } => Some(DecisionEffect::BondBurn {
            bond_id: bond_id.clone(),
        }),
        Proposal::Generic { .. } => None,
    }
}
