//! The ballot / blind-vote store: proposals, ballots, blind votes and
//! reveals, keyed by tx id and joined against committed chain state.

use crate::ballot::{Ballot, Vote};
use crate::blind_vote::{BlindVote, VoteReveal};
use crate::error::GovernanceError;
use crate::period::PeriodService;
use crate::proposal::Proposal;
use agora_ledger::LedgerState;
use agora_types::{Phase, TxId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Governance collections for all cycles, past and present.
///
/// `BTreeMap` keys give every iteration the ascending-tx-id order the tally
/// relies on for determinism.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GovernanceStore {
    proposals: BTreeMap<TxId, Proposal>,
    /// One ballot per admitted proposal, keyed by proposal tx id.
    ballots: BTreeMap<TxId, Ballot>,
    blind_votes: BTreeMap<TxId, BlindVote>,
    /// Keyed by the blind vote's tx id; the first reveal wins.
    reveals: BTreeMap<TxId, VoteReveal>,
}

impl GovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a proposal whose tx is confirmed on chain.
    ///
    /// The tx must exist, carry the classification the proposal kind
    /// demands, and sit inside the Proposal phase of the cycle the payload
    /// names. Admission creates the voter's ballot with no vote set.
    pub fn add_proposal(
        &mut self,
        proposal: Proposal,
        state: &LedgerState,
        period: &PeriodService,
    ) -> Result<(), GovernanceError> {
        let tx_id = proposal.tx_id();
        if let Err(reason) = proposal.validate() {
            return Err(GovernanceError::ValidationFailed {
                reason,
                tx_id: Some(tx_id),
            });
        }
        let meta = state
            .tx_meta(&tx_id)
            .ok_or(GovernanceError::TxNotFound(tx_id))?;
        let expected = proposal.expected_tx_type();
        if meta.tx_type != expected {
            return Err(GovernanceError::WrongTxType {
                tx_id,
                expected,
                actual: meta.tx_type,
            });
        }
        if period.phase_for(meta.block_height) != Phase::Proposal {
            return Err(GovernanceError::OutsidePhase {
                tx_id,
                tx_height: meta.block_height,
                phase: Phase::Proposal,
            });
        }
        let cycle = period
            .cycle_of(meta.block_height)
            .expect("phase check implies a cycle");
        if cycle.index != proposal.cycle_index() {
            return Err(GovernanceError::ValidationFailed {
                reason: format!(
                    "payload names cycle {} but tx confirmed in cycle {}",
                    proposal.cycle_index(),
                    cycle.index
                ),
                tx_id: Some(tx_id),
            });
        }
        if self.proposals.contains_key(&tx_id) {
            return Err(GovernanceError::DuplicateProposal(tx_id));
        }
        tracing::info!(tx = %tx_id, cycle = cycle.index, "proposal admitted");
        self.proposals.insert(tx_id, proposal);
        self.ballots.insert(tx_id, Ballot::new(tx_id));
        Ok(())
    }

    /// Set or change the local vote on a ballot.
    ///
    /// Allowed only while the chain is inside the Proposal phase of the
    /// ballot's own cycle and not on that phase's last block.
    pub fn set_vote(
        &mut self,
        proposal_tx_id: &TxId,
        vote: Option<Vote>,
        chain_height: u32,
        period: &PeriodService,
    ) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get(proposal_tx_id)
            .ok_or(GovernanceError::ProposalNotFound(*proposal_tx_id))?;
        let current_cycle = period.cycle_of(chain_height);
        let in_own_cycle =
            current_cycle.map(|c| c.index) == Some(proposal.cycle_index());
        if !in_own_cycle || !period.is_in_phase_but_not_last(Phase::Proposal, chain_height) {
            return Err(GovernanceError::PhaseLocked {
                phase: Phase::Proposal,
                height: chain_height,
            });
        }
        let ballot = self
            .ballots
            .get_mut(proposal_tx_id)
            .expect("ballot exists for every admitted proposal");
        ballot.vote = vote;
        Ok(())
    }

    /// Register the off-chain sealed payloads of a confirmed blind-vote tx.
    pub fn add_blind_vote(
        &mut self,
        blind_vote: BlindVote,
        state: &LedgerState,
        period: &PeriodService,
    ) -> Result<(), GovernanceError> {
        let tx_id = blind_vote.tx_id;
        let meta = state
            .tx_meta(&tx_id)
            .ok_or(GovernanceError::TxNotFound(tx_id))?;
        if meta.tx_type != agora_types::TxType::BlindVote {
            return Err(GovernanceError::WrongTxType {
                tx_id,
                expected: agora_types::TxType::BlindVote,
                actual: meta.tx_type,
            });
        }
        if period.phase_for(meta.block_height) != Phase::BlindVote {
            return Err(GovernanceError::OutsidePhase {
                tx_id,
                tx_height: meta.block_height,
                phase: Phase::BlindVote,
            });
        }
        if self.blind_votes.contains_key(&tx_id) {
            return Err(GovernanceError::DuplicateBlindVote(tx_id));
        }
        tracing::info!(tx = %tx_id, stake = blind_vote.stake, "blind vote registered");
        self.blind_votes.insert(tx_id, blind_vote);
        Ok(())
    }

    /// Record a reveal extracted from the chain. Reveals arrive in block
    /// order, so the first one stored is the first by height; later reveals
    /// for the same blind vote are ignored.
    pub fn add_vote_reveal(&mut self, reveal: VoteReveal) -> bool {
        match self.reveals.get(&reveal.blind_vote_tx_id) {
            Some(existing) => {
                tracing::warn!(
                    blind_vote = %reveal.blind_vote_tx_id,
                    first = %existing.tx_id,
                    ignored = %reveal.tx_id,
                    "duplicate vote reveal ignored"
                );
                false
            }
            None => {
                self.reveals.insert(reveal.blind_vote_tx_id, reveal);
                true
            }
        }
    }

    pub fn proposal(&self, tx_id: &TxId) -> Option<&Proposal> {
        self.proposals.get(tx_id)
    }

    pub fn ballot(&self, proposal_tx_id: &TxId) -> Option<&Ballot> {
        self.ballots.get(proposal_tx_id)
    }

    /// Proposals of one cycle in ascending tx-id order.
    pub fn proposals_in_cycle(&self, cycle_index: u32) -> impl Iterator<Item = &Proposal> {
        self.proposals
            .values()
            .filter(move |p| p.cycle_index() == cycle_index)
    }

    /// All blind votes in ascending tx-id order.
    pub fn blind_votes(&self) -> impl Iterator<Item = &BlindVote> {
        self.blind_votes.values()
    }

    pub fn reveal_for(&self, blind_vote_tx_id: &TxId) -> Option<&VoteReveal> {
        self.reveals.get(blind_vote_tx_id)
    }

    /// Ballots whose proposal sits in the currently active cycle and still
    /// passes validation.
    pub fn ballots_valid_and_confirmed(
        &self,
        chain_height: u32,
        period: &PeriodService,
    ) -> Vec<&Ballot> {
        let current = period.cycle_of(chain_height).map(|c| c.index);
        self.ballots
            .values()
            .filter(|ballot| {
                self.proposals
                    .get(&ballot.proposal_tx_id)
                    .filter(|p| p.validate().is_ok())
                    .map(|p| Some(p.cycle_index()) == current)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Ballots whose proposal belongs to a past cycle.
    pub fn ballots_closed(&self, chain_height: u32, period: &PeriodService) -> Vec<&Ballot> {
        let current = period.cycle_of(chain_height).map(|c| c.index);
        self.ballots
            .values()
            .filter(|ballot| {
                self.proposals
                    .get(&ballot.proposal_tx_id)
                    .map(|p| match current {
                        Some(index) => p.cycle_index() < index,
                        None => false,
                    })
                    .unwrap_or(false)
            })
            .collect()
    }
}
