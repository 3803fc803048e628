//! The block-ingest loop — the single task driving the governance core.
//!
//! Blocks arrive pre-fetched over a single-producer channel in strict
//! height order. The cancellation signal is honored between blocks only: a
//! block mid-parse either completes or was never committed.

use crate::engine::{DaoEngine, EngineError};
use agora_parser::ParseError;
use agora_types::RawBlock;
use tokio::sync::{mpsc, watch};

/// Drives a [`DaoEngine`] from a block channel until the channel closes or
/// cancellation is signalled.
pub struct IngestLoop {
    engine: DaoEngine,
    blocks: mpsc::Receiver<RawBlock>,
    cancel: watch::Receiver<bool>,
}

impl IngestLoop {
    pub fn new(
        engine: DaoEngine,
        blocks: mpsc::Receiver<RawBlock>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            blocks,
            cancel,
        }
    }

    /// Run until the block source closes or cancellation fires. Returns
    /// the engine so the host keeps the final state.
    ///
    /// A non-connecting block is logged and dropped; consensus-critical
    /// failures (stale overrides, dev-mode duplicates) abort the loop.
    pub async fn run(mut self) -> Result<DaoEngine, EngineError> {
        loop {
            if *self.cancel.borrow() {
                tracing::info!("ingest loop cancelled");
                break;
            }
            tokio::select! {
                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        tracing::info!("ingest loop cancelled");
                        break;
                    }
                }
                maybe_block = self.blocks.recv() => {
                    let Some(raw_block) = maybe_block else {
                        tracing::info!("block source closed");
                        break;
                    };
                    match self.engine.on_block(&raw_block) {
                        Ok(()) => {}
                        Err(EngineError::Parse(error @ ParseError::BlockNotConnecting { .. })) => {
                            tracing::warn!(%error, "block rejected");
                        }
                        Err(error) => {
                            tracing::error!(%error, "fatal error in block ingest");
                            return Err(error);
                        }
                    }
                }
            }
        }
        Ok(self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{BlockHash, GenesisConfig, RawTx, RawTxOutput, TxId};

    fn genesis_config() -> GenesisConfig {
        GenesisConfig::new(TxId::new([1u8; 32]), 100, 1000)
    }

    fn genesis_block() -> RawBlock {
        RawBlock {
            height: 100,
            time: 0,
            hash: BlockHash::new([100u8; 32]),
            previous_block_hash: BlockHash::ZERO,
            raw_txs: vec![RawTx {
                id: TxId::new([1u8; 32]),
                inputs: vec![],
                outputs: vec![RawTxOutput {
                    value: 1000,
                    script: vec![0x76],
                    address: "gen".into(),
                }],
            }],
        }
    }

    fn empty_block(height: u32, prev: BlockHash) -> RawBlock {
        RawBlock {
            height,
            time: 0,
            hash: BlockHash::new([height as u8; 32]),
            previous_block_hash: prev,
            raw_txs: vec![],
        }
    }

    #[tokio::test]
    async fn drains_channel_then_stops() {
        let engine = DaoEngine::new(genesis_config(), true);
        let (tx, rx) = mpsc::channel(8);
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let genesis = genesis_block();
        let next = empty_block(101, genesis.hash);
        tx.send(genesis).await.unwrap();
        tx.send(next).await.unwrap();
        drop(tx);

        let engine = IngestLoop::new(engine, rx, cancel_rx).run().await.unwrap();
        assert_eq!(engine.state().chain_height(), 101);
        assert_eq!(engine.state().unspent_supply(), 1000);
    }

    #[tokio::test]
    async fn cancellation_stops_between_blocks() {
        let engine = DaoEngine::new(genesis_config(), true);
        let (tx, rx) = mpsc::channel(8);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tx.send(genesis_block()).await.unwrap();
        let handle = tokio::spawn(IngestLoop::new(engine, rx, cancel_rx).run());

        // Give the loop a chance to process the genesis block, then cancel.
        tokio::task::yield_now().await;
        cancel_tx.send(true).unwrap();

        let engine = handle.await.unwrap().unwrap();
        assert!(engine.state().chain_height() <= 100);
    }

    #[tokio::test]
    async fn non_connecting_block_is_dropped_not_fatal() {
        let engine = DaoEngine::new(genesis_config(), true);
        let (tx, rx) = mpsc::channel(8);
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let genesis = genesis_block();
        let orphan = empty_block(101, BlockHash::new([0xee; 32]));
        let good = empty_block(101, genesis.hash);
        tx.send(genesis).await.unwrap();
        tx.send(orphan).await.unwrap();
        tx.send(good).await.unwrap();
        drop(tx);

        let engine = IngestLoop::new(engine, rx, cancel_rx).run().await.unwrap();
        assert_eq!(engine.state().chain_height(), 101);
        assert_eq!(engine.state().blocks().len(), 2);
    }
}
