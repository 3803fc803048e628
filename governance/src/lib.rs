//! Token-holder governance for the agora overlay.
//!
//! One cycle runs Proposal → Break1 → BlindVote → Break2 → VoteReveal →
//! Break3 → Result → Break4 at the block-height layer. Votes are stake- and
//! merit-weighted, sealed during the blind-vote phase and opened by an
//! on-chain key reveal. All protocol parameters are governable, including
//! the governance parameters themselves.

pub mod ballot;
pub mod blind_vote;
pub mod error;
pub mod merit;
pub mod params;
pub mod period;
pub mod proposal;
pub mod result;
pub mod store;
pub mod tally;

pub use ballot::{deserialize_ballots, serialize_ballots, Ballot, Vote};
pub use blind_vote::{BlindVote, VoteReveal};
pub use error::GovernanceError;
pub use merit::{decayed_weight, deserialize_merits, serialize_merits, MeritEntry};
pub use params::{Param, ParamRegistry};
pub use period::PeriodService;
pub use proposal::{Proposal, ProposalCommon};
pub use result::ResultApplier;
pub use store::GovernanceStore;
pub use tally::tally_cycle;
