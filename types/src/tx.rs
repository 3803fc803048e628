//! Parsed overlay transactions: classification enums, inputs, outputs.

use crate::hash::TxId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a parsed overlay transaction.
///
/// Derived strictly from the sequence of output classifications; see the
/// tx parser for the derivation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Undefined,
    /// Plain colored transfer with no burnt fee.
    TransferColored,
    /// Colored transfer whose burnt value pays a trade fee.
    PayTradeFee,
    Proposal,
    CompensationRequest,
    BlindVote,
    VoteReveal,
    Lockup,
    Unlock,
    Genesis,
    AssetRemoval,
    /// A tx that carried overlay intent but violated a structural rule.
    /// Its colored input value is burnt; it creates no colored outputs.
    Irregular,
}

/// Per-output classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxOutputType {
    Undefined,
    /// Output of the genesis tx, up to the configured total supply.
    Genesis,
    /// A plain colored output.
    Colored,
    /// A base-chain output (not colored). Once one appears, the latch rule
    /// forces all later outputs of the tx to this type.
    BaseOut,
    ProposalOpReturn,
    CompRequestOpReturn,
    BlindVoteOpReturn,
    VoteRevealOpReturn,
    LockupOpReturn,
    UnlockOpReturn,
    AssetRemovalOpReturn,
    /// Output 0 of a compensation request: becomes `Issuance` only if the
    /// proposal is accepted.
    IssuanceCandidate,
    /// A colored output minted by an accepted compensation proposal.
    Issuance,
    /// Colored output locked under a lock time.
    Lockup,
    /// Colored output releasing a previous lockup.
    Unlock,
    /// An op-return output that failed intent decoding.
    OpReturnOther,
}

impl TxOutputType {
    /// Whether outputs of this type carry colored value and can be spent as
    /// colored inputs.
    pub fn is_colored(&self) -> bool {
        matches!(
            self,
            TxOutputType::Genesis
                | TxOutputType::Colored
                | TxOutputType::Issuance
                | TxOutputType::Lockup
                | TxOutputType::Unlock
        )
    }
}

/// Decoded op-return intent of a tx, as read from its marker output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpReturnData {
    /// 20-byte digest of the proposal payload.
    Proposal { digest: [u8; 20] },
    /// 20-byte digest of the compensation-request payload.
    CompRequest { digest: [u8; 20] },
    /// Commitment to the encrypted ballot list.
    BlindVote { commitment: [u8; 20] },
    /// Merit-list digest plus the revealed 128-bit ballot key.
    VoteReveal { merit_digest: [u8; 20], secret_key: [u8; 16] },
    /// Lock time in blocks.
    Lockup { lock_time: u32 },
    /// Tx id of the lockup being released.
    Unlock { lockup_tx_id: TxId },
    /// 20-byte digest of the asset-removal payload.
    AssetRemoval { digest: [u8; 20] },
}

/// Key addressing one output of one tx. Ordering is lexicographic on
/// (tx-id bytes, index), which fixes the iteration order of every
/// output collection in committed state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxOutputKey {
    pub tx_id: TxId,
    pub index: u32,
}

impl TxOutputKey {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Debug for TxOutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.tx_id, self.index)
    }
}

/// A parsed input with its resolved colored value, if the spent output was
/// colored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub spent_output: TxOutputKey,
    /// Colored value of the spent output; `None` when it was a base output.
    pub colored_value: Option<u64>,
}

/// A parsed, classified output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub tx_id: TxId,
    pub index: u32,
    /// Value in base units.
    pub value: u64,
    pub address: String,
    pub output_type: TxOutputType,
    /// Lock time in blocks, set only on `Lockup` outputs.
    pub lock_time: Option<u32>,
    pub spent: bool,
}

impl TxOutput {
    pub fn key(&self) -> TxOutputKey {
        TxOutputKey::new(self.tx_id, self.index)
    }
}

/// A parsed overlay transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub id: TxId,
    pub tx_type: TxType,
    pub block_height: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Colored input value not assigned to any colored output.
    pub burnt_fee: u64,
    /// Decoded intent from the op-return marker output, if any.
    pub op_return: Option<OpReturnData>,
}

impl Tx {
    /// Sum of resolved colored input values.
    pub fn colored_input_value(&self) -> u64 {
        self.inputs.iter().filter_map(|i| i.colored_value).sum()
    }

    /// Sum of colored output values.
    pub fn colored_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .filter(|o| o.output_type.is_colored())
            .map(|o| o.value)
            .sum()
    }
}
