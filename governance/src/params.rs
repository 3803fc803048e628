//! All governable protocol parameters and their height-versioned registry.
//!
//! Every parameter can be changed by an accepted change-param proposal,
//! including the governance parameters themselves (self-governing quorums,
//! thresholds and phase durations). Identifiers are persisted as-is and
//! must never be renamed once the overlay has launched; default values are
//! frozen once the genesis block is processed — only height-indexed
//! overrides may be appended.

use crate::error::GovernanceError;
use agora_types::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Enum of all protocol parameters changeable by governance vote.
///
/// `Undefined` is the null-object fallback for decode errors; it is never
/// governed and its value is never read by consensus code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Param {
    Undefined,

    // Trade fees in colored units
    MinMakerFeeToken,
    MinTakerFeeToken,
    DefaultMakerFeeToken,
    DefaultTakerFeeToken,

    // Trade fees in base units
    MinMakerFeeBase,
    MinTakerFeeBase,
    DefaultMakerFeeBase,
    DefaultTakerFeeBase,

    // Fees burnt by governance txs
    ProposalFee,
    BlindVoteFee,

    // Quorums per proposal type, in stake units
    QuorumProposal,
    QuorumCompRequest,
    QuorumChangeParam,
    QuorumRemoveAsset,

    // Thresholds per proposal type, in basis points (5000 = 50.00%)
    ThresholdProposal,
    ThresholdCompRequest,
    ThresholdChangeParam,
    ThresholdRemoveAsset,

    // Phase durations in blocks
    PhaseProposal,
    PhaseBreak1,
    PhaseBlindVote,
    PhaseBreak2,
    PhaseVoteReveal,
    PhaseBreak3,
    PhaseResult,
    PhaseBreak4,

    // Lockup bounds in blocks
    LockTimeMin,
    LockTimeMax,

    // Merit decay half-life in blocks
    MeritHalfLifeBlocks,
}

impl Param {
    /// Every governed parameter, excluding the `Undefined` sentinel.
    pub const ALL: [Param; 29] = [
        Param::MinMakerFeeToken,
        Param::MinTakerFeeToken,
        Param::DefaultMakerFeeToken,
        Param::DefaultTakerFeeToken,
        Param::MinMakerFeeBase,
        Param::MinTakerFeeBase,
        Param::DefaultMakerFeeBase,
        Param::DefaultTakerFeeBase,
        Param::ProposalFee,
        Param::BlindVoteFee,
        Param::QuorumProposal,
        Param::QuorumCompRequest,
        Param::QuorumChangeParam,
        Param::QuorumRemoveAsset,
        Param::ThresholdProposal,
        Param::ThresholdCompRequest,
        Param::ThresholdChangeParam,
        Param::ThresholdRemoveAsset,
        Param::PhaseProposal,
        Param::PhaseBreak1,
        Param::PhaseBlindVote,
        Param::PhaseBreak2,
        Param::PhaseVoteReveal,
        Param::PhaseBreak3,
        Param::PhaseResult,
        Param::PhaseBreak4,
        Param::LockTimeMin,
        Param::LockTimeMax,
        Param::MeritHalfLifeBlocks,
    ];

    /// Persistence-stable identifier. Never rename.
    pub fn id(&self) -> &'static str {
        match self {
            Param::Undefined => "UNDEFINED",
            Param::MinMakerFeeToken => "MIN_MAKER_FEE_TOKEN",
            Param::MinTakerFeeToken => "MIN_TAKER_FEE_TOKEN",
            Param::DefaultMakerFeeToken => "DEFAULT_MAKER_FEE_TOKEN",
            Param::DefaultTakerFeeToken => "DEFAULT_TAKER_FEE_TOKEN",
            Param::MinMakerFeeBase => "MIN_MAKER_FEE_BASE",
            Param::MinTakerFeeBase => "MIN_TAKER_FEE_BASE",
            Param::DefaultMakerFeeBase => "DEFAULT_MAKER_FEE_BASE",
            Param::DefaultTakerFeeBase => "DEFAULT_TAKER_FEE_BASE",
            Param::ProposalFee => "PROPOSAL_FEE",
            Param::BlindVoteFee => "BLIND_VOTE_FEE",
            Param::QuorumProposal => "QUORUM_PROPOSAL",
            Param::QuorumCompRequest => "QUORUM_COMP_REQUEST",
            Param::QuorumChangeParam => "QUORUM_CHANGE_PARAM",
            Param::QuorumRemoveAsset => "QUORUM_REMOVE_ASSET",
            Param::ThresholdProposal => "THRESHOLD_PROPOSAL",
            Param::ThresholdCompRequest => "THRESHOLD_COMP_REQUEST",
            Param::ThresholdChangeParam => "THRESHOLD_CHANGE_PARAM",
            Param::ThresholdRemoveAsset => "THRESHOLD_REMOVE_ASSET",
            Param::PhaseProposal => "PHASE_PROPOSAL",
            Param::PhaseBreak1 => "PHASE_BREAK1",
            Param::PhaseBlindVote => "PHASE_BLIND_VOTE",
            Param::PhaseBreak2 => "PHASE_BREAK2",
            Param::PhaseVoteReveal => "PHASE_VOTE_REVEAL",
            Param::PhaseBreak3 => "PHASE_BREAK3",
            Param::PhaseResult => "PHASE_RESULT",
            Param::PhaseBreak4 => "PHASE_BREAK4",
            Param::LockTimeMin => "LOCK_TIME_MIN",
            Param::LockTimeMax => "LOCK_TIME_MAX",
            Param::MeritHalfLifeBlocks => "MERIT_HALF_LIFE_BLOCKS",
        }
    }

    /// Resolve a persisted identifier back to its parameter.
    pub fn from_id(id: &str) -> Option<Param> {
        Param::ALL.iter().copied().find(|p| p.id() == id)
    }

    /// Default value, fixed at launch.
    pub fn default_value(&self) -> i64 {
        match self {
            Param::Undefined => -1,

            Param::MinMakerFeeToken => 5,
            Param::MinTakerFeeToken => 5,
            Param::DefaultMakerFeeToken => 200,
            Param::DefaultTakerFeeToken => 200,

            Param::MinMakerFeeBase => 5_000,
            Param::MinTakerFeeBase => 5_000,
            Param::DefaultMakerFeeBase => 200_000,
            Param::DefaultTakerFeeBase => 200_000,

            Param::ProposalFee => 100,
            Param::BlindVoteFee => 200,

            Param::QuorumProposal => 10_000,
            Param::QuorumCompRequest => 10_000,
            Param::QuorumChangeParam => 100_000,
            Param::QuorumRemoveAsset => 10_000,

            Param::ThresholdProposal => 5_000,
            Param::ThresholdCompRequest => 5_000,
            Param::ThresholdChangeParam => 7_500,
            Param::ThresholdRemoveAsset => 5_000,

            Param::PhaseProposal => 3_456,
            Param::PhaseBreak1 => 10,
            Param::PhaseBlindVote => 576,
            Param::PhaseBreak2 => 10,
            Param::PhaseVoteReveal => 432,
            Param::PhaseBreak3 => 10,
            Param::PhaseResult => 1,
            Param::PhaseBreak4 => 10,

            Param::LockTimeMin => 0,
            Param::LockTimeMax => 65_535,

            Param::MeritHalfLifeBlocks => 52_560,
        }
    }

    /// The duration parameter governing a phase.
    pub fn for_phase(phase: Phase) -> Param {
        match phase {
            Phase::Undefined => Param::Undefined,
            Phase::Proposal => Param::PhaseProposal,
            Phase::Break1 => Param::PhaseBreak1,
            Phase::BlindVote => Param::PhaseBlindVote,
            Phase::Break2 => Param::PhaseBreak2,
            Phase::VoteReveal => Param::PhaseVoteReveal,
            Phase::Break3 => Param::PhaseBreak3,
            Phase::Result => Param::PhaseResult,
            Phase::Break4 => Param::PhaseBreak4,
        }
    }
}

/// Height-versioned parameter store.
///
/// Per parameter a strictly-increasing list of `(height, value)` overrides;
/// lookups binary-search the list and fall back to the default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParamRegistry {
    overrides: BTreeMap<Param, Vec<(u32, i64)>>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of `param` as of `at_height`: the most recent override at
    /// or before that height, else the default.
    pub fn value(&self, param: Param, at_height: u32) -> i64 {
        match self.overrides.get(&param) {
            Some(list) => {
                let idx = list.partition_point(|(h, _)| *h <= at_height);
                if idx == 0 {
                    param.default_value()
                } else {
                    list[idx - 1].1
                }
            }
            None => param.default_value(),
        }
    }

    /// Append an override effective from `at_height`. Heights must be
    /// strictly increasing per parameter.
    pub fn append_override(
        &mut self,
        param: Param,
        at_height: u32,
        value: i64,
    ) -> Result<(), GovernanceError> {
        let list = self.overrides.entry(param).or_default();
        if let Some((last_height, _)) = list.last() {
            if at_height <= *last_height {
                return Err(GovernanceError::StaleOverride {
                    param_id: param.id(),
                    last_height: *last_height,
                    at_height,
                });
            }
        }
        tracing::info!(param = param.id(), at_height, value, "parameter override appended");
        list.push((at_height, value));
        Ok(())
    }

    /// All parameters with their defaults, in identifier order.
    pub fn enumerate(&self) -> Vec<(Param, i64)> {
        let mut all: Vec<_> = Param::ALL.iter().map(|p| (*p, p.default_value())).collect();
        all.sort_by_key(|(p, _)| p.id());
        all
    }

    /// Export every parameter's override list in identifier order, for the
    /// state snapshot.
    pub fn export(&self) -> Vec<agora_ledger::ParamOverrides> {
        let mut all: Vec<_> = Param::ALL
            .iter()
            .map(|p| agora_ledger::ParamOverrides {
                id: p.id().to_string(),
                default_value: p.default_value(),
                overrides: self.overrides.get(p).cloned().unwrap_or_default(),
            })
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_falls_back_to_default() {
        let registry = ParamRegistry::new();
        assert_eq!(registry.value(Param::ProposalFee, 0), 100);
        assert_eq!(registry.value(Param::ProposalFee, 1_000_000), 100);
        assert_eq!(registry.value(Param::Undefined, 10), -1);
    }

    #[test]
    fn override_takes_effect_at_height() {
        let mut registry = ParamRegistry::new();
        registry
            .append_override(Param::ProposalFee, 214, 150)
            .unwrap();

        assert_eq!(registry.value(Param::ProposalFee, 212), 100);
        assert_eq!(registry.value(Param::ProposalFee, 213), 100);
        assert_eq!(registry.value(Param::ProposalFee, 214), 150);
        assert_eq!(registry.value(Param::ProposalFee, 500), 150);
    }

    #[test]
    fn lookup_picks_latest_override_at_or_before() {
        let mut registry = ParamRegistry::new();
        registry.append_override(Param::BlindVoteFee, 100, 10).unwrap();
        registry.append_override(Param::BlindVoteFee, 200, 20).unwrap();
        registry.append_override(Param::BlindVoteFee, 300, 30).unwrap();

        // Below the first override the default applies.
        assert_eq!(
            registry.value(Param::BlindVoteFee, 99),
            Param::BlindVoteFee.default_value()
        );
        assert_eq!(registry.value(Param::BlindVoteFee, 100), 10);
        assert_eq!(registry.value(Param::BlindVoteFee, 250), 20);
        assert_eq!(registry.value(Param::BlindVoteFee, 300), 30);
    }

    #[test]
    fn stale_override_rejected() {
        let mut registry = ParamRegistry::new();
        registry.append_override(Param::ProposalFee, 200, 150).unwrap();

        let same = registry.append_override(Param::ProposalFee, 200, 160);
        assert!(matches!(
            same,
            Err(GovernanceError::StaleOverride { at_height: 200, .. })
        ));

        let earlier = registry.append_override(Param::ProposalFee, 150, 160);
        assert!(matches!(earlier, Err(GovernanceError::StaleOverride { .. })));

        // Different param unaffected.
        registry.append_override(Param::BlindVoteFee, 150, 90).unwrap();
    }

    #[test]
    fn ids_are_unique_and_roundtrip() {
        let mut seen = std::collections::BTreeSet::new();
        for param in Param::ALL {
            assert!(seen.insert(param.id()), "duplicate id {}", param.id());
            assert_eq!(Param::from_id(param.id()), Some(param));
        }
        assert_eq!(Param::from_id("NOPE"), None);
    }

    #[test]
    fn enumerate_is_sorted_by_id() {
        let registry = ParamRegistry::new();
        let all = registry.enumerate();
        assert_eq!(all.len(), Param::ALL.len());
        for pair in all.windows(2) {
            assert!(pair[0].0.id() < pair[1].0.id());
        }
    }

    #[test]
    fn phase_duration_params() {
        assert_eq!(Param::for_phase(Phase::Proposal), Param::PhaseProposal);
        assert_eq!(Param::for_phase(Phase::Break4), Param::PhaseBreak4);
        assert_eq!(Param::for_phase(Phase::Undefined), Param::Undefined);
    }
}
