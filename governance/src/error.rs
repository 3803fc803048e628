use agora_types::{Phase, TxId, TxType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    /// An override was appended at or below the last override height.
    /// Violates the monotone-height invariant and is always fatal.
    #[error("stale override for {param_id}: last height {last_height}, got {at_height}")]
    StaleOverride {
        param_id: &'static str,
        last_height: u32,
        at_height: u32,
    },

    #[error("mutation locked: height {height} is outside the open part of {phase:?}")]
    PhaseLocked { phase: Phase, height: u32 },

    #[error("validation failed: {reason}")]
    ValidationFailed {
        reason: String,
        tx_id: Option<TxId>,
    },

    #[error("tx {0} not found in committed state")]
    TxNotFound(TxId),

    #[error("tx {tx_id} has type {actual:?}, expected {expected:?}")]
    WrongTxType {
        tx_id: TxId,
        expected: TxType,
        actual: TxType,
    },

    #[error("tx {tx_id} at height {tx_height} is outside the {phase:?} phase of its cycle")]
    OutsidePhase {
        tx_id: TxId,
        tx_height: u32,
        phase: Phase,
    },

    #[error("proposal {0} already registered")]
    DuplicateProposal(TxId),

    #[error("blind vote {0} already registered")]
    DuplicateBlindVote(TxId),

    #[error("proposal {0} not found")]
    ProposalNotFound(TxId),

    #[error("malformed ballot list")]
    MalformedBallotList,

    #[error("malformed merit list")]
    MalformedMeritList,

    #[error(transparent)]
    Ledger(#[from] agora_ledger::LedgerError),
}
