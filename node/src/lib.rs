//! The agora governance core, wired together.
//!
//! [`DaoEngine`] owns the committed state and advances it one block at a
//! time; [`IngestLoop`] drives it from a pre-fetched block channel with a
//! cancellation signal checked between blocks. The engine is a library —
//! it surfaces typed errors and never terminates the host.

pub mod engine;
pub mod ingest;
pub mod logging;

pub use engine::{DaoEngine, EngineError};
pub use ingest::IngestLoop;
pub use logging::{init_logging, LogFormat};
