//! The governance engine: one struct owning the whole committed state and
//! advancing it block by block.
//!
//! `on_block` is the single mutation entry point. Per block the engine
//! parses txs, registers on-chain vote reveals, rolls the cycle machine
//! forward, runs the tally at the first Result block and activates staged
//! outcomes at the following cycle's first block. Everything in between is
//! deterministic: same prior state and block, same posterior state and
//! event sequence.

use agora_governance::{
    tally_cycle, BlindVote, GovernanceError, GovernanceStore, ParamRegistry, PeriodService,
    Proposal, ResultApplier, Vote, VoteReveal,
};
use agora_ledger::{DaoEvent, EventBus, LedgerState, StateSnapshot};
use agora_parser::{BlockParser, ParseError};
use agora_types::{GenesisConfig, Phase, RawBlock, TxId, TxType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),
}

/// The single-task governance core.
pub struct DaoEngine {
    state: LedgerState,
    registry: ParamRegistry,
    period: PeriodService,
    store: GovernanceStore,
    applier: ResultApplier,
    bus: EventBus,
    dev_mode: bool,
}

impl DaoEngine {
    pub fn new(genesis: GenesisConfig, dev_mode: bool) -> Self {
        Self::with_registry(genesis, ParamRegistry::new(), dev_mode)
    }

    /// Start from a pre-seeded registry (e.g. network-specific overrides
    /// appended below the genesis height).
    pub fn with_registry(
        genesis: GenesisConfig,
        registry: ParamRegistry,
        dev_mode: bool,
    ) -> Self {
        let period = PeriodService::new(genesis.block_height);
        Self {
            state: LedgerState::new(genesis),
            registry,
            period,
            store: GovernanceStore::new(),
            applier: ResultApplier::new(),
            bus: EventBus::new(),
            dev_mode,
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DaoEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn registry(&self) -> &ParamRegistry {
        &self.registry
    }

    pub fn period(&self) -> &PeriodService {
        &self.period
    }

    pub fn store(&self) -> &GovernanceStore {
        &self.store
    }

    /// A deterministic snapshot of the committed state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::create(&self.state, self.registry.export())
    }

    /// Ingest the next raw block. Blocks must arrive in strict height
    /// order; a non-connecting block is rejected without any state change.
    pub fn on_block(&mut self, raw_block: &RawBlock) -> Result<(), EngineError> {
        BlockParser::validate_connecting(&self.state, raw_block)?;

        let height = raw_block.height;

        // Outcomes of the previous cycle activate at this height, before
        // any tx of this block reads the registry.
        self.applier
            .apply_due(height, &mut self.registry, &mut self.state)?;

        let parser = BlockParser::new(&self.registry, self.dev_mode);
        if parser
            .parse_block(&mut self.state, &self.bus, raw_block)?
            .is_none()
        {
            return Ok(());
        }

        self.register_reveals(height);

        self.period.roll_forward(height, &self.registry);
        let phase = self.period.phase_for(height);
        let previous_phase = match height.checked_sub(1) {
            Some(parent) => self.period.phase_for(parent),
            None => Phase::Undefined,
        };
        if phase != previous_phase {
            self.bus.emit(&DaoEvent::PhaseChanged { height, phase });
        }

        let cycle = self.period.cycle_of(height).cloned();
        if let Some(cycle) = cycle {
            if cycle.first_block_of(Phase::Result) == Some(height) {
                let result = tally_cycle(&cycle, &self.state, &self.registry, &self.store);
                self.applier.stage(&result, cycle.last_block() + 1);
                self.bus.emit(&DaoEvent::CycleComplete(result));
            }
        }
        Ok(())
    }

    /// Pull vote reveals out of the freshly committed block. The first
    /// reveal per blind vote wins; later ones are ignored.
    fn register_reveals(&mut self, height: u32) {
        let reveals: Vec<VoteReveal> = self
            .state
            .block_at(height)
            .map(|block| {
                block
                    .txs
                    .iter()
                    .filter(|tx| tx.tx_type == TxType::VoteReveal)
                    .filter_map(VoteReveal::from_tx)
                    .collect()
            })
            .unwrap_or_default();
        for reveal in reveals {
            self.store.add_vote_reveal(reveal);
        }
    }

    /// Admit a proposal payload for a confirmed proposal tx.
    pub fn submit_proposal(&mut self, proposal: Proposal) -> Result<(), EngineError> {
        self.store
            .add_proposal(proposal, &self.state, &self.period)?;
        Ok(())
    }

    /// Attach the sealed payloads of a confirmed blind-vote tx.
    pub fn submit_blind_vote(&mut self, blind_vote: BlindVote) -> Result<(), EngineError> {
        self.store
            .add_blind_vote(blind_vote, &self.state, &self.period)?;
        Ok(())
    }

    /// Set the local vote on an admitted proposal's ballot. Locked outside
    /// the open part of the Proposal phase of the ballot's cycle.
    pub fn set_vote(
        &mut self,
        proposal_tx_id: &TxId,
        vote: Option<Vote>,
    ) -> Result<(), EngineError> {
        self.store
            .set_vote(proposal_tx_id, vote, self.state.chain_height(), &self.period)?;
        Ok(())
    }
}
