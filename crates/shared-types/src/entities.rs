//! # Core Domain Entities
//!
//! Block, header and transaction types shared by every component of the node.
//!
//! ## Clusters
//!
//! - **Chain**: `ShardHeader`, `MetaBlock`, `Header`, `Body`, `MiniBlock`
//! - **Transactions**: `Transaction`, `SmartContractResult`, `AnyTransaction`
//! - **Bookkeeping**: `HeaderState`, `BlockType`, `ShardId`

use serde::{Deserialize, Serialize};

use crate::constants::METACHAIN_SHARD_ID;
use crate::errors::DataError;

// Re-export U256 from primitive-types for use across all components
pub use primitive_types::U256;

/// Hash bytes as produced by the node's `Hasher`.
///
/// Kept as a byte vector because the wire format allows empty hashes
/// (a genesis header has no parent).
pub type Hash = Vec<u8>;

/// Shard identifier. The metachain uses `METACHAIN_SHARD_ID`.
pub type ShardId = u32;

/// Account address bytes, validated by an address converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Address(Vec<u8>);

impl Address {
    /// Wrap raw address bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Address length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-length address.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if every byte is zero (the deployment marker).
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<&[u8]> for Address {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// Kind of content carried by a mini-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum BlockType {
    /// Regular user transactions.
    #[default]
    TxBlock,
    /// Cross-shard smart contract results.
    SmartContractResultBlock,
    /// State changes.
    StateBlock,
    /// Validator set changes.
    PeerBlock,
    /// Transactions rejected during processing.
    InvalidBlock,
}

/// Lifecycle state of a header inside the fork detector registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderState {
    /// Seen on the network, not yet applied.
    Received,
    /// Applied by this node.
    Processed,
    /// Authored by this node, not yet broadcast.
    Proposed,
    /// Confirmed by a metachain block.
    Notarized,
}

/// Ordered batch of transaction hashes between a shard pair.
///
/// `tx_hashes` is kept sorted when built by the node so that two nodes
/// packaging the same set produce byte-identical mini-blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MiniBlock {
    /// Hashes of the included transactions or results.
    pub tx_hashes: Vec<Hash>,
    /// Destination shard.
    pub receiver_shard_id: ShardId,
    /// Origin shard.
    pub sender_shard_id: ShardId,
    /// Content kind.
    pub block_type: BlockType,
}

/// Summary of a mini-block stored inside a shard header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MiniBlockHeader {
    /// Hash of the marshaled mini-block.
    pub hash: Hash,
    /// Origin shard.
    pub sender_shard_id: ShardId,
    /// Destination shard.
    pub receiver_shard_id: ShardId,
    /// Number of hashes in the mini-block.
    pub tx_count: u32,
    /// Content kind.
    pub block_type: BlockType,
}

/// Block body: the list of mini-blocks referenced by a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Body {
    /// Mini-blocks in proposal order.
    pub mini_blocks: Vec<MiniBlock>,
}

impl Body {
    /// Create a body from mini-blocks.
    pub fn new(mini_blocks: Vec<MiniBlock>) -> Self {
        Self { mini_blocks }
    }

    /// Structural self-consistency check.
    ///
    /// An empty body is valid; a mini-block without hashes is not.
    pub fn integrity_and_validity(&self) -> Result<(), DataError> {
        for (index, mini_block) in self.mini_blocks.iter().enumerate() {
            if mini_block.tx_hashes.is_empty() {
                return Err(DataError::MiniBlockEmpty { index });
            }
        }
        Ok(())
    }

    /// Returns true if the body carries no mini-blocks.
    pub fn is_empty(&self) -> bool {
        self.mini_blocks.is_empty()
    }
}

/// A shard chain block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShardHeader {
    /// Block height.
    pub nonce: u64,
    /// Consensus round in which the block was proposed.
    pub round: u64,
    /// Hash of the previous header.
    pub prev_hash: Hash,
    /// Random seed of the previous header.
    pub prev_rand_seed: Vec<u8>,
    /// Random seed produced for this header.
    pub rand_seed: Vec<u8>,
    /// Aggregated consensus signature.
    pub signature: Vec<u8>,
    /// Bitmap of the consensus members that signed.
    pub pub_keys_bitmap: Vec<u8>,
    /// Account state root after applying the block.
    pub root_hash: Vec<u8>,
    /// Shard that produced the block.
    pub shard_id: ShardId,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Mini-blocks referenced by this header.
    pub mini_block_headers: Vec<MiniBlockHeader>,
    /// Metachain blocks this header acknowledges.
    pub meta_block_hashes: Vec<Hash>,
    /// Total number of transactions in the body.
    pub tx_count: u32,
}

/// Shard header reference carried by a metachain block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShardData {
    /// Shard of the notarized header.
    pub shard_id: ShardId,
    /// Hash of the notarized header.
    pub header_hash: Hash,
    /// Transactions in the notarized block.
    pub tx_count: u32,
}

/// A metachain block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MetaBlock {
    /// Block height.
    pub nonce: u64,
    /// Consensus round in which the block was proposed.
    pub round: u64,
    /// Hash of the previous metachain header.
    pub prev_hash: Hash,
    /// Random seed of the previous header.
    pub prev_rand_seed: Vec<u8>,
    /// Random seed produced for this header.
    pub rand_seed: Vec<u8>,
    /// Aggregated consensus signature.
    pub signature: Vec<u8>,
    /// Bitmap of the consensus members that signed.
    pub pub_keys_bitmap: Vec<u8>,
    /// Peer state root.
    pub root_hash: Vec<u8>,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Shard headers notarized by this block.
    pub shard_info: Vec<ShardData>,
    /// Total number of transactions notarized.
    pub tx_count: u32,
}

/// A block header of either chain kind.
///
/// Marshaling the enum (not the inner struct) defines a header's identity,
/// so a shard header and a meta block never hash alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Header {
    /// Header produced by a regular shard.
    Shard(ShardHeader),
    /// Header produced by the metachain.
    Meta(MetaBlock),
}

impl Header {
    /// Block height.
    pub fn nonce(&self) -> u64 {
        match self {
            Header::Shard(h) => h.nonce,
            Header::Meta(h) => h.nonce,
        }
    }

    /// Consensus round.
    pub fn round(&self) -> u64 {
        match self {
            Header::Shard(h) => h.round,
            Header::Meta(h) => h.round,
        }
    }

    /// Hash of the previous header.
    pub fn prev_hash(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.prev_hash,
            Header::Meta(h) => &h.prev_hash,
        }
    }

    /// Random seed of the previous header.
    pub fn prev_rand_seed(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.prev_rand_seed,
            Header::Meta(h) => &h.prev_rand_seed,
        }
    }

    /// Random seed of this header.
    pub fn rand_seed(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.rand_seed,
            Header::Meta(h) => &h.rand_seed,
        }
    }

    /// Aggregated signature.
    pub fn signature(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.signature,
            Header::Meta(h) => &h.signature,
        }
    }

    /// Signers bitmap.
    pub fn pub_keys_bitmap(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.pub_keys_bitmap,
            Header::Meta(h) => &h.pub_keys_bitmap,
        }
    }

    /// State root after the block.
    pub fn root_hash(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.root_hash,
            Header::Meta(h) => &h.root_hash,
        }
    }

    /// Producing shard; the metachain id for meta blocks.
    pub fn shard_id(&self) -> ShardId {
        match self {
            Header::Shard(h) => h.shard_id,
            Header::Meta(_) => METACHAIN_SHARD_ID,
        }
    }

    /// Unix timestamp.
    pub fn timestamp(&self) -> u64 {
        match self {
            Header::Shard(h) => h.timestamp,
            Header::Meta(h) => h.timestamp,
        }
    }

    /// A header is signed iff its signers bitmap is non-empty.
    pub fn is_signed(&self) -> bool {
        !self.pub_keys_bitmap().is_empty()
    }

    /// Returns true for metachain headers.
    pub fn is_meta(&self) -> bool {
        matches!(self, Header::Meta(_))
    }

    /// Short variant name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Header::Shard(_) => "shard",
            Header::Meta(_) => "meta",
        }
    }
}

impl From<ShardHeader> for Header {
    fn from(header: ShardHeader) -> Self {
        Header::Shard(header)
    }
}

impl From<MetaBlock> for Header {
    fn from(header: MetaBlock) -> Self {
        Header::Meta(header)
    }
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// A user transaction as intercepted from the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transaction {
    /// Sender nonce.
    pub nonce: u64,
    /// Transferred amount.
    pub value: U256,
    /// Receiver address bytes. All-zero for contract deployment.
    pub receiver: Vec<u8>,
    /// Sender address bytes.
    pub sender: Vec<u8>,
    /// Price per gas unit.
    pub gas_price: u64,
    /// Maximum gas units.
    pub gas_limit: u64,
    /// Call data or contract code.
    pub data: Vec<u8>,
    /// Sender signature.
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Fee reserved by the transaction: `gas_price * gas_limit`.
    pub fn fee(&self) -> U256 {
        U256::from(self.gas_price) * U256::from(self.gas_limit)
    }

    /// Total amount the sender must hold: fee plus value. `None` when the
    /// sum does not fit a `U256`.
    pub fn total_cost(&self) -> Option<U256> {
        self.fee().checked_add(self.value)
    }
}

/// A cross-shard side effect produced while executing a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SmartContractResult {
    /// Nonce of the originating transaction.
    pub nonce: u64,
    /// Amount credited to the receiver.
    pub value: U256,
    /// Receiver address bytes.
    pub receiver: Vec<u8>,
    /// Sender address bytes (the contract or the original caller).
    pub sender: Vec<u8>,
    /// Code to install on the receiver, if any.
    pub code: Vec<u8>,
    /// Encoded storage updates.
    pub data: Vec<u8>,
    /// Hash of the transaction that produced this result.
    pub tx_hash: Hash,
}

/// Any transaction-like payload handled by processors and pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyTransaction {
    /// A user transaction.
    Tx(Transaction),
    /// A smart contract result.
    Scr(SmartContractResult),
}

impl AnyTransaction {
    /// Sender address bytes.
    pub fn sender(&self) -> &[u8] {
        match self {
            AnyTransaction::Tx(tx) => &tx.sender,
            AnyTransaction::Scr(scr) => &scr.sender,
        }
    }

    /// Receiver address bytes.
    pub fn receiver(&self) -> &[u8] {
        match self {
            AnyTransaction::Tx(tx) => &tx.receiver,
            AnyTransaction::Scr(scr) => &scr.receiver,
        }
    }
}
