//! Entry points that turn raw wire bytes into DAG nodes.

use alloc::vec::Vec;

use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::cursor::Cursor;
use crate::error::{DagError, Result};
use crate::header::BlockHeader;
use crate::merkle::{build_merkle_tree, TxTree, TX_TREE_SIZE};
use crate::node::{DagNode, Node};
use crate::transaction::{Transaction, MIN_TX_LEN};
use crate::varint::read_count;

/// Knobs for [`decode_block_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail if the header's merkle root differs from the rebuilt tree.
    pub verify_merkle_root: bool,
    /// Reject inputs longer than this before parsing anything.
    pub max_message_len: Option<usize>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merkle_root_check(mut self, verify: bool) -> Self {
        self.verify_merkle_root = verify;
        self
    }

    pub fn with_max_message_len(mut self, limit: usize) -> Self {
        self.max_message_len = Some(limit);
        self
    }
}

/// A fully decoded block message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMessage {
    pub header: BlockHeader,
    /// Transactions in wire order.
    pub transactions: Vec<Transaction>,
    /// Merkle pair nodes, layer by layer, left to right.
    pub tree: Vec<TxTree>,
}

impl BlockMessage {
    /// Address of the top of the rebuilt merkle tree.
    ///
    /// For a single transaction this is the transaction itself.
    pub fn computed_merkle_root(&self) -> Option<Address> {
        match self.tree.last() {
            Some(top) => Some(top.address()),
            None => self.transactions.first().map(|tx| tx.address()),
        }
    }

    /// Check the header's declared merkle root against the transactions.
    pub fn verify_merkle_root(&self) -> Result<()> {
        let computed = self.computed_merkle_root().ok_or(DagError::NoTransactions)?;
        if computed != self.header.merkle_root {
            return Err(DagError::MerkleRootMismatch {
                declared: self.header.merkle_root.display_hex(),
                computed: computed.display_hex(),
            });
        }
        Ok(())
    }

    /// Total number of nodes: header, transactions and tree pairs.
    pub fn node_count(&self) -> usize {
        1 + self.transactions.len() + self.tree.len()
    }

    /// All nodes as a flat list: header, transactions, then tree pairs.
    pub fn nodes(&self) -> Vec<Node> {
        self.clone().into_nodes()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        let mut out = Vec::with_capacity(self.node_count());
        out.push(Node::Header(self.header));
        out.extend(self.transactions.into_iter().map(Node::Transaction));
        out.extend(self.tree.into_iter().map(Node::Tree));
        out
    }

    /// Find a node of this block by address.
    pub fn get(&self, address: &Address) -> Option<Node> {
        if self.header.address() == *address {
            return Some(Node::Header(self.header.clone()));
        }
        if let Some(tx) = self.transactions.iter().find(|tx| tx.address() == *address) {
            return Some(Node::Transaction(tx.clone()));
        }
        self.tree
            .iter()
            .find(|node| node.address() == *address)
            .map(|node| Node::Tree(node.clone()))
    }
}

/// Decode a block message into a flat node list.
pub fn decode_block_message(bytes: &[u8]) -> Result<Vec<Node>> {
    Ok(decode_block(bytes)?.into_nodes())
}

/// Decode a block message with default options.
pub fn decode_block(bytes: &[u8]) -> Result<BlockMessage> {
    decode_block_with(bytes, &DecodeOptions::default())
}

/// Decode a block message: header, transaction count, transactions, then
/// the merkle tree over the transaction addresses.
pub fn decode_block_with(bytes: &[u8], options: &DecodeOptions) -> Result<BlockMessage> {
    check_size(bytes, options)?;

    let mut cursor = Cursor::new(bytes);
    let header = BlockHeader::decode_checked(&mut cursor)?;

    let tx_count = read_count(&mut cursor, "tx_count")?;
    debug!(block = %header.display_hex(), tx_count, "decoding block message");

    let mut transactions = Vec::with_capacity(cursor.capacity_hint(tx_count, MIN_TX_LEN));
    for index in 0..tx_count {
        let tx = Transaction::decode(&mut cursor).map_err(|e| {
            debug!(index, error = %e, "failed to decode transaction");
            e
        })?;
        trace!(index, txid = %tx.display_hex(), segwit = tx.is_segwit(), "decoded transaction");
        transactions.push(tx);
    }
    expect_consumed(&cursor)?;

    let leaves: Vec<Address> = transactions.iter().map(|tx| tx.address()).collect();
    let tree = build_merkle_tree(&leaves);
    debug!(tree_nodes = tree.len(), "built merkle tree");

    let message = BlockMessage {
        header,
        transactions,
        tree,
    };

    if options.verify_merkle_root {
        if let Err(e) = message.verify_merkle_root() {
            warn!(error = %e, "merkle root check failed");
            return Err(e);
        }
    }

    Ok(message)
}

/// Decode a standalone 80-byte block header.
pub fn decode_header(bytes: &[u8]) -> Result<BlockHeader> {
    let mut cursor = Cursor::new(bytes);
    let header = BlockHeader::decode_checked(&mut cursor)?;
    expect_consumed(&cursor)?;
    Ok(header)
}

/// Decode a standalone transaction.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction> {
    let mut cursor = Cursor::new(bytes);
    let tx = Transaction::decode(&mut cursor)?;
    expect_consumed(&cursor)?;
    Ok(tx)
}

/// Decode a detached 64-byte merkle pair.
pub fn decode_tx_tree(bytes: &[u8]) -> Result<TxTree> {
    TxTree::from_bytes(bytes)
}

/// Decode a node from the transaction address space: 64 bytes is a merkle
/// pair, anything else a transaction.
pub fn decode_tx_or_tree(bytes: &[u8]) -> Result<Node> {
    if bytes.len() == TX_TREE_SIZE {
        return Ok(Node::Tree(decode_tx_tree(bytes)?));
    }
    Ok(Node::Transaction(decode_transaction(bytes)?))
}

fn check_size(bytes: &[u8], options: &DecodeOptions) -> Result<()> {
    match options.max_message_len {
        Some(limit) if bytes.len() > limit => Err(DagError::MessageTooLarge {
            len: bytes.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

fn expect_consumed(cursor: &Cursor<'_>) -> Result<()> {
    if !cursor.is_empty() {
        let consumed = cursor.position();
        return Err(DagError::TrailingBytes {
            consumed,
            total: consumed + cursor.remaining(),
        });
    }
    Ok(())
}
