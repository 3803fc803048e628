use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The raw block does not extend the stored chain tip. The block is
    /// rejected with no state change.
    #[error("block {height} does not connect: {reason}")]
    BlockNotConnecting { height: u32, reason: String },

    /// A block at this height was already parsed. Fatal in dev mode.
    #[error("block at height {0} already parsed")]
    DuplicateBlock(u32),

    #[error(transparent)]
    Ledger(#[from] agora_ledger::LedgerError),
}
