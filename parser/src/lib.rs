//! Block and tx parsing for the agora colored-coin overlay.
//!
//! A raw block connects to the chain by parent hash and height, its txs are
//! classified output by output against the colored UTXO set, and the
//! committed result is announced on the event bus.

pub mod block_parser;
pub mod error;
pub mod genesis;
pub mod op_return;
pub mod tx_parser;

pub use block_parser::BlockParser;
pub use error::ParseError;
pub use op_return::{decode as decode_op_return, encode as encode_op_return, OpReturnError};
pub use tx_parser::TxParser;
