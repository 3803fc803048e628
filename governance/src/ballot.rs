//! Ballots: a voter-local pairing of proposal and vote.
//!
//! The ballot list a voter seals into a blind vote uses a deterministic,
//! length-prefixed encoding sorted by proposal tx id, so every node derives
//! the identical ciphertext commitment from the identical ballot list.

use crate::error::GovernanceError;
use agora_types::TxId;
use serde::{Deserialize, Serialize};

/// A vote on one proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Accept,
    Reject,
    /// Counted for quorum stake, but weighs on neither side.
    Ignore,
}

/// A proposal reference with the voter's (possibly still unset) vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub proposal_tx_id: TxId,
    pub vote: Option<Vote>,
}

impl Ballot {
    pub fn new(proposal_tx_id: TxId) -> Self {
        Self {
            proposal_tx_id,
            vote: None,
        }
    }
}

fn vote_tag(vote: Option<Vote>) -> u8 {
    match vote {
        None => 0,
        Some(Vote::Accept) => 1,
        Some(Vote::Reject) => 2,
        Some(Vote::Ignore) => 3,
    }
}

fn vote_from_tag(tag: u8) -> Result<Option<Vote>, GovernanceError> {
    match tag {
        0 => Ok(None),
        1 => Ok(Some(Vote::Accept)),
        2 => Ok(Some(Vote::Reject)),
        3 => Ok(Some(Vote::Ignore)),
        _ => Err(GovernanceError::MalformedBallotList),
    }
}

/// Encode a ballot list: `count:u32le` then per ballot the 32-byte proposal
/// tx id and a one-byte vote tag, sorted ascending by proposal tx id.
pub fn serialize_ballots(ballots: &[Ballot]) -> Vec<u8> {
    let mut sorted: Vec<&Ballot> = ballots.iter().collect();
    sorted.sort_by_key(|b| b.proposal_tx_id);

    let mut bytes = Vec::with_capacity(4 + sorted.len() * 33);
    bytes.extend_from_slice(&(sorted.len() as u32).to_le_bytes());
    for ballot in sorted {
        bytes.extend_from_slice(ballot.proposal_tx_id.as_bytes());
        bytes.push(vote_tag(ballot.vote));
    }
    bytes
}

/// Decode a ballot list produced by [`serialize_ballots`].
pub fn deserialize_ballots(bytes: &[u8]) -> Result<Vec<Ballot>, GovernanceError> {
    if bytes.len() < 4 {
        return Err(GovernanceError::MalformedBallotList);
    }
    let count = u32::from_le_bytes(bytes[..4].try_into().expect("4 bytes")) as usize;
    let body = &bytes[4..];
    if body.len() != count * 33 {
        return Err(GovernanceError::MalformedBallotList);
    }
    let mut ballots = Vec::with_capacity(count);
    for chunk in body.chunks_exact(33) {
        let tx_id = TxId::new(chunk[..32].try_into().expect("32 bytes"));
        let vote = vote_from_tag(chunk[32])?;
        ballots.push(Ballot {
            proposal_tx_id: tx_id,
            vote,
        });
    }
    Ok(ballots)
}
