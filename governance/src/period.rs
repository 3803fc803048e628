//! Maps block height to governance cycle and phase.
//!
//! Cycles are instantiated lazily as the chain advances: the first at the
//! genesis height, each following one at the block after the previous
//! cycle's Break4. Phase durations are read from the parameter registry at
//! the cycle's first block and frozen into the [`Cycle`], so a duration
//! change decided in cycle `c` shapes cycle `c+1` onward.

use crate::params::{Param, ParamRegistry};
use agora_types::{Cycle, Phase};
use serde::{Deserialize, Serialize};

/// The cycle state machine. Pure function of height once cycles are built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodService {
    genesis_height: u32,
    cycles: Vec<Cycle>,
}

impl PeriodService {
    pub fn new(genesis_height: u32) -> Self {
        Self {
            genesis_height,
            cycles: Vec::new(),
        }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Build cycles until `height` is covered. Returns the newly created
    /// cycle when one begins exactly at `height`.
    pub fn roll_forward(&mut self, height: u32, registry: &ParamRegistry) -> Option<&Cycle> {
        if height < self.genesis_height {
            return None;
        }
        let mut created_at_height = false;
        if self.cycles.is_empty() {
            let cycle = Self::build_cycle(0, self.genesis_height, registry);
            created_at_height = cycle.first_block == height;
            self.cycles.push(cycle);
        }
        loop {
            let last = self.cycles.last().expect("at least one cycle");
            if last.last_block() >= height {
                break;
            }
            let cycle = Self::build_cycle(last.index + 1, last.last_block() + 1, registry);
            created_at_height = cycle.first_block == height;
            self.cycles.push(cycle);
        }
        if created_at_height {
            self.cycles.last()
        } else {
            None
        }
    }

    fn build_cycle(index: u32, first_block: u32, registry: &ParamRegistry) -> Cycle {
        let phases = Phase::ORDERED
            .iter()
            .map(|phase| {
                let duration = registry.value(Param::for_phase(*phase), first_block);
                (*phase, u32::try_from(duration).unwrap_or(0))
            })
            .collect();
        let cycle = Cycle::new(index, first_block, phases);
        tracing::debug!(
            index,
            first_block,
            duration = cycle.duration(),
            "governance cycle created"
        );
        cycle
    }

    /// The cycle containing `height`, if any.
    pub fn cycle_of(&self, height: u32) -> Option<&Cycle> {
        if height < self.genesis_height {
            return None;
        }
        // Cycles are contiguous and sorted by first block.
        let idx = self
            .cycles
            .partition_point(|cycle| cycle.first_block <= height);
        if idx == 0 {
            return None;
        }
        let cycle = &self.cycles[idx - 1];
        cycle.contains(height).then_some(cycle)
    }

    /// The phase of `height`; `Undefined` outside all built cycles.
    pub fn phase_for(&self, height: u32) -> Phase {
        self.cycle_of(height)
            .map(|cycle| cycle.phase_for(height))
            .unwrap_or(Phase::Undefined)
    }

    /// First block of `phase` within the cycle containing `height`.
    pub fn first_block_of(&self, phase: Phase, height: u32) -> Option<u32> {
        self.cycle_of(height)?.first_block_of(phase)
    }

    /// Last block of `phase` within the cycle containing `height`.
    pub fn last_block_of(&self, phase: Phase, height: u32) -> Option<u32> {
        self.cycle_of(height)?.last_block_of(phase)
    }

    /// True iff `height` lies in `phase` and is not that phase's last block.
    /// Used to forbid mutations that could no longer propagate before the
    /// phase closes.
    pub fn is_in_phase_but_not_last(&self, phase: Phase, height: u32) -> bool {
        self.phase_for(height) == phase && self.last_block_of(phase, height) != Some(height)
    }

    /// Whether `tx_height` and `chain_height` fall in the same cycle.
    pub fn in_same_cycle(&self, tx_height: u32, chain_height: u32) -> bool {
        match (self.cycle_of(tx_height), self.cycle_of(chain_height)) {
            (Some(a), Some(b)) => a.index == b.index,
            _ => false,
        }
    }
}
