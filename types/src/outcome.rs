//! Per-cycle vote outcomes as delivered to event subscribers.

use crate::hash::TxId;
use serde::{Deserialize, Serialize};

/// Result of tallying one proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteResult {
    Accepted,
    /// Total participating stake fell short of the quorum for the proposal
    /// type.
    RejectedQuorum,
    /// Accept ratio fell short of the threshold for the proposal type.
    RejectedThreshold,
}

/// The concrete consequence of an accepted proposal.
///
/// Parameter changes and issuance are applied by the core at the next
/// cycle's first block; asset removal and bond burning only surface here
/// for external collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionEffect {
    ParamChange {
        /// Persistence-stable parameter identifier.
        param_id: String,
        value: i64,
    },
    Issuance {
        /// The compensation-request tx whose candidate output is promoted.
        tx_id: TxId,
        amount: u64,
        address: String,
    },
    AssetRemoval {
        asset_ticker: String,
    },
    BondBurn {
        bond_id: String,
    },
}

/// Tally outcome for a single proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub proposal_tx_id: TxId,
    pub result: VoteResult,
    pub accept_weight: u64,
    pub reject_weight: u64,
    /// Stake of every vote that included this proposal, whatever the vote.
    pub total_stake: u64,
    /// Present only on accepted proposals.
    pub effect: Option<DecisionEffect>,
}

/// Everything decided in one cycle, in ascending proposal-tx-id order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle_index: u32,
    pub decisions: Vec<Decision>,
}
