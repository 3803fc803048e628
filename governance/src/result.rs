//! Applies accepted cycle outcomes at the next cycle's first block.
//!
//! Parameter overrides and compensation issuance from cycle `c` take effect
//! at the first block of cycle `c+1`; until then they are staged here.

use crate::error::GovernanceError;
use crate::params::{Param, ParamRegistry};
use agora_ledger::LedgerState;
use agora_types::{CycleResult, DecisionEffect, TxId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PendingCycle {
    activation_height: u32,
    /// Accepted parameter changes in ascending identifier order.
    changes: Vec<(Param, i64)>,
    /// Compensation-request txs to issue.
    issuances: Vec<TxId>,
}

/// Batches accepted decisions per cycle and applies them when their
/// activation block arrives.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResultApplier {
    pending: Vec<PendingCycle>,
}

impl ResultApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the accepted effects of a tallied cycle for activation at
    /// `activation_height` (the next cycle's first block).
    pub fn stage(&mut self, result: &CycleResult, activation_height: u32) {
        let mut changes = Vec::new();
        let mut issuances = Vec::new();
        for decision in &result.decisions {
            match &decision.effect {
                Some(DecisionEffect::ParamChange { param_id, value }) => {
                    match Param::from_id(param_id) {
                        Some(param) => changes.push((param, *value)),
                        None => tracing::warn!(param_id, "unknown param in accepted decision"),
                    }
                }
                Some(DecisionEffect::Issuance { tx_id, .. }) => issuances.push(*tx_id),
                Some(DecisionEffect::AssetRemoval { .. })
                | Some(DecisionEffect::BondBurn { .. })
                | None => {}
            }
        }
        changes.sort_by_key(|(param, _)| param.id());
        if changes.is_empty() && issuances.is_empty() {
            return;
        }
        tracing::info!(
            cycle = result.cycle_index,
            activation_height,
            changes = changes.len(),
            issuances = issuances.len(),
            "cycle result staged"
        );
        self.pending.push(PendingCycle {
            activation_height,
            changes,
            issuances,
        });
    }

    /// Apply every staged result whose activation block is `height`.
    ///
    /// A failing override append means the registry saw a height at or past
    /// the activation block already — a consensus violation, surfaced as an
    /// error rather than recovered.
    pub fn apply_due(
        &mut self,
        height: u32,
        registry: &mut ParamRegistry,
        state: &mut LedgerState,
    ) -> Result<(), GovernanceError> {
        let mut remaining = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.activation_height != height {
                remaining.push(entry);
                continue;
            }
            for (param, value) in &entry.changes {
                registry.append_override(*param, height, *value)?;
            }
            for tx_id in &entry.issuances {
                state.apply_issuance(*tx_id, height)?;
            }
        }
        self.pending = remaining;
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{Decision, GenesisConfig, VoteResult};

    fn tx_id(seed: u8) -> TxId {
        TxId::new([seed; 32])
    }

    fn change_result(param: Param, value: i64) -> CycleResult {
        CycleResult {
            cycle_index: 0,
            decisions: vec![Decision {
                proposal_tx_id: tx_id(7),
                result: VoteResult::Accepted,
                accept_weight: 10,
                reject_weight: 0,
                total_stake: 10,
                effect: Some(DecisionEffect::ParamChange {
                    param_id: param.id().to_string(),
                    value,
                }),
            }],
        }
    }

    #[test]
    fn staged_change_applies_only_at_activation_height() {
        let mut applier = ResultApplier::new();
        let mut registry = ParamRegistry::new();
        let mut state = LedgerState::new(GenesisConfig::new(tx_id(1), 100, 1000));

        applier.stage(&change_result(Param::ProposalFee, 150), 214);
        assert!(applier.has_pending());

        applier.apply_due(213, &mut registry, &mut state).unwrap();
        assert_eq!(registry.value(Param::ProposalFee, 213), 100);
        assert!(applier.has_pending());

        applier.apply_due(214, &mut registry, &mut state).unwrap();
        assert_eq!(registry.value(Param::ProposalFee, 213), 100);
        assert_eq!(registry.value(Param::ProposalFee, 214), 150);
        assert!(!applier.has_pending());
    }

    #[test]
    fn changes_apply_in_identifier_order() {
        let mut applier = ResultApplier::new();
        let mut registry = ParamRegistry::new();
        let mut state = LedgerState::new(GenesisConfig::new(tx_id(1), 100, 1000));

        let result = CycleResult {
            cycle_index: 0,
            decisions: vec![
                Decision {
                    proposal_tx_id: tx_id(9),
                    result: VoteResult::Accepted,
                    accept_weight: 1,
                    reject_weight: 0,
                    total_stake: 1,
                    effect: Some(DecisionEffect::ParamChange {
                        param_id: Param::QuorumProposal.id().to_string(),
                        value: 9_999,
                    }),
                },
                Decision {
                    proposal_tx_id: tx_id(8),
                    result: VoteResult::Accepted,
                    accept_weight: 1,
                    reject_weight: 0,
                    total_stake: 1,
                    effect: Some(DecisionEffect::ParamChange {
                        param_id: Param::BlindVoteFee.id().to_string(),
                        value: 300,
                    }),
                },
            ],
        };
        applier.stage(&result, 214);
        applier.apply_due(214, &mut registry, &mut state).unwrap();

        assert_eq!(registry.value(Param::QuorumProposal, 214), 9_999);
        assert_eq!(registry.value(Param::BlindVoteFee, 214), 300);
    }

    #[test]
    fn rejected_only_results_stage_nothing() {
        let mut applier = ResultApplier::new();
        let result = CycleResult {
            cycle_index: 0,
            decisions: vec![Decision {
                proposal_tx_id: tx_id(7),
                result: VoteResult::RejectedQuorum,
                accept_weight: 0,
                reject_weight: 0,
                total_stake: 0,
                effect: None,
            }],
        };
        applier.stage(&result, 214);
        assert!(!applier.has_pending());
    }

    #[test]
    fn stale_override_is_surfaced() {
        let mut applier = ResultApplier::new();
        let mut registry = ParamRegistry::new();
        let mut state = LedgerState::new(GenesisConfig::new(tx_id(1), 100, 1000));

        registry
            .append_override(Param::ProposalFee, 300, 120)
            .unwrap();
        applier.stage(&change_result(Param::ProposalFee, 150), 214);

        let err = applier.apply_due(214, &mut registry, &mut state);
        assert!(matches!(err, Err(GovernanceError::StaleOverride { .. })));
    }
}
