//! Committed overlay state for the agora governance core.
//!
//! Blocks and their txs are append-only; the colored UTXO set is the only
//! mutated collection (outputs flip to spent, issuance candidates are
//! promoted). Readers observe the state as of the last fully-committed
//! block; all writes happen on the single ingest task.

pub mod error;
pub mod events;
pub mod snapshot;
pub mod state;

pub use error::LedgerError;
pub use events::{DaoEvent, EventBus};
pub use snapshot::{ParamOverrides, StateSnapshot};
pub use state::{LedgerState, TxMeta};
