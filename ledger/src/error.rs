use agora_types::{TxId, TxOutputKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no block is open for tx commit")]
    NoCurrentBlock,

    #[error("input spends unknown colored output {0:?}")]
    UnknownOutput(TxOutputKey),

    #[error("tx {0} has no issuance candidate output")]
    NoIssuanceCandidate(TxId),
}
