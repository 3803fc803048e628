//! Connects raw blocks to the chain and drives tx parsing.
//!
//! Dependency chains inside one block are resolved with a work list: a tx
//! whose input references a still-pending sibling is deferred and retried
//! after the rest of the block, until a full pass resolves nothing new.
//! Iterations are capped at the block's tx count; whatever remains is
//! treated as having no colored inputs.

use crate::error::ParseError;
use crate::genesis;
use crate::tx_parser::TxParser;
use agora_governance::ParamRegistry;
use agora_ledger::{DaoEvent, EventBus, LedgerState};
use agora_types::{Block, RawBlock, RawTx, TxId};
use std::collections::HashSet;

/// Parses raw blocks into the committed overlay state.
pub struct BlockParser<'a> {
    registry: &'a ParamRegistry,
    /// In dev mode a duplicate block is fatal; in production it is logged
    /// and the block discarded.
    dev_mode: bool,
}

impl<'a> BlockParser<'a> {
    pub fn new(registry: &'a ParamRegistry, dev_mode: bool) -> Self {
        Self { registry, dev_mode }
    }

    /// Check that `raw_block` extends the stored chain tip: the first block
    /// must sit at the genesis height, every later one must link to its
    /// parent by hash and height.
    pub fn validate_connecting(state: &LedgerState, raw_block: &RawBlock) -> Result<(), ParseError> {
        match state.last_block() {
            None => {
                let genesis_height = state.genesis_config().block_height;
                if raw_block.height != genesis_height {
                    return Err(ParseError::BlockNotConnecting {
                        height: raw_block.height,
                        reason: format!("ledger is empty, expected genesis height {genesis_height}"),
                    });
                }
            }
            Some(last) => {
                if last.hash != raw_block.previous_block_hash {
                    return Err(ParseError::BlockNotConnecting {
                        height: raw_block.height,
                        reason: format!(
                            "previous hash {} does not match chain tip {}",
                            raw_block.previous_block_hash, last.hash
                        ),
                    });
                }
                if last.height + 1 != raw_block.height {
                    return Err(ParseError::BlockNotConnecting {
                        height: raw_block.height,
                        reason: format!("expected height {}", last.height + 1),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse one raw block into the state. Returns the committed block, or
    /// `None` when a duplicate was discarded in production mode.
    pub fn parse_block(
        &self,
        state: &mut LedgerState,
        bus: &EventBus,
        raw_block: &RawBlock,
    ) -> Result<Option<Block>, ParseError> {
        let height = raw_block.height;
        tracing::debug!(height, txs = raw_block.raw_txs.len(), "parsing block");

        Self::validate_connecting(state, raw_block)?;

        state.on_new_block_height(height);
        bus.emit(&DaoEvent::NewBlockHeight(height));

        if state.has_block_at(height) {
            if self.dev_mode {
                return Err(ParseError::DuplicateBlock(height));
            }
            tracing::warn!(height, "block already added, discarding");
            return Ok(None);
        }
        let envelope = Block::from_header(raw_block);
        state.add_empty_block(envelope.clone());
        bus.emit(&DaoEvent::EmptyBlockAdded(envelope));

        let genesis_id = state.genesis_config().tx_id;
        let is_genesis_block = height == state.genesis_config().block_height;
        if is_genesis_block {
            match genesis::find_genesis_tx(state.genesis_config(), raw_block) {
                Some(tx) => state.commit_tx(tx)?,
                None => tracing::warn!(height, "no genesis tx in the genesis block"),
            }
        }

        let candidates: Vec<&RawTx> = raw_block
            .raw_txs
            .iter()
            .filter(|raw_tx| !(is_genesis_block && raw_tx.id == genesis_id))
            .collect();
        self.parse_txs(state, height, candidates)?;

        let block = state
            .block_at(height)
            .cloned()
            .expect("block committed above");
        bus.emit(&DaoEvent::ParseBlockComplete(block.clone()));
        Ok(Some(block))
    }

    /// Work-list fixed point over the block's txs.
    fn parse_txs(
        &self,
        state: &mut LedgerState,
        height: u32,
        mut pending: Vec<&RawTx>,
    ) -> Result<(), ParseError> {
        let tx_parser = TxParser::new(self.registry);
        let max_iterations = pending.len();
        let mut iterations = 0;

        while !pending.is_empty() && iterations < max_iterations {
            let pending_ids: HashSet<TxId> = pending.iter().map(|raw_tx| raw_tx.id).collect();
            let mut deferred = Vec::new();
            let mut progressed = false;

            for raw_tx in &pending {
                let depends_on_sibling = raw_tx.inputs.iter().any(|input| {
                    input.prev_tx_id != raw_tx.id && pending_ids.contains(&input.prev_tx_id)
                });
                if depends_on_sibling {
                    deferred.push(*raw_tx);
                    continue;
                }
                progressed = true;
                if let Some(tx) = tx_parser.parse(raw_tx, height, state) {
                    state.commit_tx(tx)?;
                }
            }

            if !progressed {
                break;
            }
            pending = deferred;
            iterations += 1;
        }

        if !pending.is_empty() {
            tracing::debug!(
                height,
                leftover = pending.len(),
                iterations,
                "dependency fixed point did not drain, treating leftovers as unconnected"
            );
            for raw_tx in pending {
                if let Some(tx) = tx_parser.parse(raw_tx, height, state) {
                    state.commit_tx(tx)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{BlockHash, GenesisConfig, RawTxInput, RawTxOutput, TxType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tx_id(seed: u8) -> TxId {
        TxId::new([seed; 32])
    }

    fn block_hash(seed: u8) -> BlockHash {
        BlockHash::new([seed; 32])
    }

    fn value_out(value: u64) -> RawTxOutput {
        RawTxOutput {
            value,
            script: vec![0x76],
            address: "addr".into(),
        }
    }

    fn spend(prev: TxId, index: u32) -> RawTxInput {
        RawTxInput {
            prev_tx_id: prev,
            prev_output_index: index,
        }
    }

    fn genesis_config() -> GenesisConfig {
        GenesisConfig::new(tx_id(1), 100, 1000)
    }

    fn genesis_raw_block() -> RawBlock {
        RawBlock {
            height: 100,
            time: 1_000,
            hash: block_hash(100),
            previous_block_hash: BlockHash::ZERO,
            raw_txs: vec![RawTx {
                id: tx_id(1),
                inputs: vec![],
                outputs: vec![value_out(600), value_out(400)],
            }],
        }
    }

    fn next_block(prev: &RawBlock, raw_txs: Vec<RawTx>) -> RawBlock {
        RawBlock {
            height: prev.height + 1,
            time: prev.time + 600,
            hash: block_hash(prev.height as u8 + 1),
            previous_block_hash: prev.hash,
            raw_txs,
        }
    }

    #[test]
    fn genesis_block_commits_genesis_tx() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let bus = EventBus::new();

        let block = parser
            .parse_block(&mut state, &bus, &genesis_raw_block())
            .unwrap()
            .unwrap();

        assert_eq!(block.txs.len(), 1);
        assert_eq!(block.txs[0].tx_type, TxType::Genesis);
        assert_eq!(state.chain_height(), 100);
        assert_eq!(state.unspent_supply(), 1000);
    }

    #[test]
    fn first_block_must_be_at_genesis_height() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let bus = EventBus::new();

        let mut raw = genesis_raw_block();
        raw.height = 99;
        let err = parser.parse_block(&mut state, &bus, &raw);
        assert!(matches!(err, Err(ParseError::BlockNotConnecting { .. })));
        assert!(state.is_empty());
    }

    #[test]
    fn non_connecting_block_rejected_without_state_change() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let bus = EventBus::new();

        let genesis = genesis_raw_block();
        parser.parse_block(&mut state, &bus, &genesis).unwrap();

        // Wrong parent hash.
        let mut bad = next_block(&genesis, vec![]);
        bad.previous_block_hash = block_hash(0xee);
        assert!(matches!(
            parser.parse_block(&mut state, &bus, &bad),
            Err(ParseError::BlockNotConnecting { .. })
        ));

        // Height gap.
        let mut gap = next_block(&genesis, vec![]);
        gap.height = 102;
        assert!(matches!(
            parser.parse_block(&mut state, &bus, &gap),
            Err(ParseError::BlockNotConnecting { .. })
        ));

        assert_eq!(state.chain_height(), 100);
        assert_eq!(state.blocks().len(), 1);
    }

    #[test]
    fn event_order_per_block() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let mut bus = EventBus::new();

        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        bus.subscribe(Box::new(move |event| {
            let name = match event {
                DaoEvent::NewBlockHeight(_) => "height",
                DaoEvent::EmptyBlockAdded(_) => "empty",
                DaoEvent::ParseBlockComplete(_) => "complete",
                _ => "other",
            };
            sink.lock().unwrap().push(name);
        }));

        parser
            .parse_block(&mut state, &bus, &genesis_raw_block())
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["height", "empty", "complete"]);
    }

    #[test]
    fn intra_block_dependency_chain_resolves() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let bus = EventBus::new();

        let genesis = genesis_raw_block();
        parser.parse_block(&mut state, &bus, &genesis).unwrap();

        // Delivered in reverse dependency order: c spends b spends a.
        let a = RawTx {
            id: tx_id(0x0a),
            inputs: vec![spend(tx_id(1), 0)],
            outputs: vec![value_out(600)],
        };
        let b = RawTx {
            id: tx_id(0x0b),
            inputs: vec![spend(tx_id(0x0a), 0)],
            outputs: vec![value_out(600)],
        };
        let c = RawTx {
            id: tx_id(0x0c),
            inputs: vec![spend(tx_id(0x0b), 0)],
            outputs: vec![value_out(550)],
        };
        let block_101 = next_block(&genesis, vec![c.clone(), b.clone(), a.clone()]);

        let block = parser
            .parse_block(&mut state, &bus, &block_101)
            .unwrap()
            .unwrap();

        assert_eq!(block.txs.len(), 3);
        assert_eq!(block.txs[0].id, tx_id(0x0a));
        assert_eq!(block.txs[1].id, tx_id(0x0b));
        assert_eq!(block.txs[2].id, tx_id(0x0c));
        assert_eq!(block.txs[2].tx_type, TxType::PayTradeFee);
        assert_eq!(state.total_burnt(), 50);
    }

    #[test]
    fn counts_only_overlay_txs() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let bus = EventBus::new();

        let genesis = genesis_raw_block();
        parser.parse_block(&mut state, &bus, &genesis).unwrap();

        // A pure base-chain tx: spends nothing colored.
        let plain = RawTx {
            id: tx_id(0x33),
            inputs: vec![spend(tx_id(0x99), 4)],
            outputs: vec![value_out(5_000)],
        };
        let colored = RawTx {
            id: tx_id(0x34),
            inputs: vec![spend(tx_id(1), 1)],
            outputs: vec![value_out(400)],
        };
        let block_101 = next_block(&genesis, vec![plain, colored]);
        let block = parser
            .parse_block(&mut state, &bus, &block_101)
            .unwrap()
            .unwrap();

        assert_eq!(block.txs.len(), 1);
        assert_eq!(block.txs[0].id, tx_id(0x34));
    }

    #[test]
    fn double_spend_within_block_resolves_first_wins() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let bus = EventBus::new();

        let genesis = genesis_raw_block();
        parser.parse_block(&mut state, &bus, &genesis).unwrap();

        let first = RawTx {
            id: tx_id(0x41),
            inputs: vec![spend(tx_id(1), 0)],
            outputs: vec![value_out(600)],
        };
        let second = RawTx {
            id: tx_id(0x42),
            inputs: vec![spend(tx_id(1), 0)],
            outputs: vec![value_out(600)],
        };
        let block_101 = next_block(&genesis, vec![first, second]);
        let block = parser
            .parse_block(&mut state, &bus, &block_101)
            .unwrap()
            .unwrap();

        // The second spend resolves no colored input and is dropped.
        assert_eq!(block.txs.len(), 1);
        assert_eq!(block.txs[0].id, tx_id(0x41));
        assert_eq!(state.unspent_supply(), 1000);
    }

    #[test]
    fn listener_counts_every_block() {
        let registry = ParamRegistry::new();
        let parser = BlockParser::new(&registry, true);
        let mut state = LedgerState::new(genesis_config());
        let mut bus = EventBus::new();

        let completed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&completed);
        bus.subscribe(Box::new(move |event| {
            if matches!(event, DaoEvent::ParseBlockComplete(_)) {
                sink.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let genesis = genesis_raw_block();
        parser.parse_block(&mut state, &bus, &genesis).unwrap();
        let block_101 = next_block(&genesis, vec![]);
        parser.parse_block(&mut state, &bus, &block_101).unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }
}
