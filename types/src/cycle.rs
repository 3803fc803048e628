//! Governance cycles and their phases at the block-height layer.

use serde::{Deserialize, Serialize};

/// The ordered phases of one governance cycle.
///
/// `Undefined` is the sentinel for heights before the first cycle begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Undefined,
    Proposal,
    Break1,
    BlindVote,
    Break2,
    VoteReveal,
    Break3,
    Result,
    Break4,
}

impl Phase {
    /// The phases of a cycle in consensus order.
    pub const ORDERED: [Phase; 8] = [
        Phase::Proposal,
        Phase::Break1,
        Phase::BlindVote,
        Phase::Break2,
        Phase::VoteReveal,
        Phase::Break3,
        Phase::Result,
        Phase::Break4,
    ];
}

/// One governance cycle: a contiguous block-height range divided into
/// phases. Phase durations are snapshotted from the parameter registry at
/// the cycle's first block and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub index: u32,
    pub first_block: u32,
    /// `(phase, duration_in_blocks)` in consensus order.
    pub phases: Vec<(Phase, u32)>,
}

impl Cycle {
    pub fn new(index: u32, first_block: u32, phases: Vec<(Phase, u32)>) -> Self {
        Self {
            index,
            first_block,
            phases,
        }
    }

    /// Total duration in blocks.
    pub fn duration(&self) -> u32 {
        self.phases.iter().map(|(_, d)| d).sum()
    }

    /// The last block height belonging to this cycle.
    pub fn last_block(&self) -> u32 {
        self.first_block + self.duration().saturating_sub(1)
    }

    /// Whether `height` falls inside this cycle.
    pub fn contains(&self, height: u32) -> bool {
        height >= self.first_block && height <= self.last_block()
    }

    /// The phase `height` falls into. Zero-duration phases own no heights.
    pub fn phase_for(&self, height: u32) -> Phase {
        if !self.contains(height) {
            return Phase::Undefined;
        }
        let mut cursor = self.first_block;
        for (phase, duration) in &self.phases {
            if *duration == 0 {
                continue;
            }
            if height < cursor + duration {
                return *phase;
            }
            cursor += duration;
        }
        Phase::Undefined
    }

    /// First block height of `phase`, or `None` for zero-duration phases.
    pub fn first_block_of(&self, phase: Phase) -> Option<u32> {
        let mut cursor = self.first_block;
        for (p, duration) in &self.phases {
            if *p == phase {
                return (*duration > 0).then_some(cursor);
            }
            cursor += duration;
        }
        None
    }

    /// Last block height of `phase`, or `None` for zero-duration phases.
    pub fn last_block_of(&self, phase: Phase) -> Option<u32> {
        let mut cursor = self.first_block;
        for (p, duration) in &self.phases {
            if *p == phase {
                return (*duration > 0).then_some(cursor + duration - 1);
            }
            cursor += duration;
        }
        None
    }
}
