//! Merkle tree construction for Bitcoin transactions.
//!
//! Every internal node of the tree is materialized as a [`TxTree`] pair so it
//! can be stored and fetched on its own.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::address::{Address, NodeKind};
use crate::error::{DagError, Result};
use crate::node::{link_at, DagNode, Link, Node, Resolved};

/// Size of a serialized tree node: two 32-byte hashes.
pub const TX_TREE_SIZE: usize = 64;

/// An internal merkle tree node linking to its left and right children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxTree {
    pub left: Link,
    pub right: Link,
}

impl TxTree {
    /// Pair two child addresses.
    pub fn new(left: Address, right: Address) -> Self {
        TxTree {
            left: Link::named("0", left),
            right: Link::named("1", right),
        }
    }

    /// Rebuild a detached pair from its 64-byte serialization.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TX_TREE_SIZE {
            return Err(DagError::InvalidTreeNodeLength(bytes.len()));
        }

        let mut left = [0u8; 32];
        let mut right = [0u8; 32];
        left.copy_from_slice(&bytes[..32]);
        right.copy_from_slice(&bytes[32..]);

        Ok(TxTree::new(
            Address::from_digest(left, NodeKind::Tx),
            Address::from_digest(right, NodeKind::Tx),
        ))
    }

    /// Serialize as left hash followed by right hash.
    pub fn serialize(&self) -> [u8; TX_TREE_SIZE] {
        let mut combined = [0u8; TX_TREE_SIZE];
        combined[..32].copy_from_slice(self.left.address.digest());
        combined[32..].copy_from_slice(self.right.address.digest());
        combined
    }
}

impl DagNode for TxTree {
    fn kind(&self) -> NodeKind {
        NodeKind::Tx
    }

    fn raw_data(&self) -> Vec<u8> {
        self.serialize().to_vec()
    }

    fn links(&self) -> Vec<Link> {
        vec![self.left.clone(), self.right.clone()]
    }

    fn resolve<'p>(&self, path: &'p [&'p str]) -> Result<(Resolved, &'p [&'p str])> {
        let Some(first) = path.first() else {
            return Err(DagError::path_not_found(path, "zero length path"));
        };

        match *first {
            "0" => link_at(self.left.clone(), path, 1),
            "1" => link_at(self.right.clone(), path, 1),
            _ => Err(DagError::path_not_found(path, "no such link")),
        }
    }

    fn tree(&self, path: &str, depth: usize) -> Vec<String> {
        if depth == 0 || !path.is_empty() {
            return Vec::new();
        }
        vec!["0".to_string(), "1".to_string()]
    }

    fn copy(&self) -> Node {
        Node::Tree(self.clone())
    }
}

/// Build every layer of the merkle tree above `leaves`.
///
/// Each layer with an odd number of entries has its last entry duplicated
/// before pairing, as Bitcoin does. Layers are returned bottom-up; the last
/// layer holds the single top node. One leaf (or none) yields no layers.
pub fn build_merkle_layers(leaves: &[Address]) -> Vec<Vec<TxTree>> {
    let mut layers = Vec::new();
    let mut current_level: Vec<Address> = leaves.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity((current_level.len() + 1) / 2);

        for pair in current_level.chunks(2) {
            let left = pair[0];
            // If odd number of elements, duplicate the last one
            let right = pair.get(1).copied().unwrap_or(left);
            next_level.push(TxTree::new(left, right));
        }

        current_level = next_level.iter().map(|node| node.address()).collect();
        layers.push(next_level);
    }

    layers
}

/// Build the merkle tree and flatten it layer by layer, left to right.
pub fn build_merkle_tree(leaves: &[Address]) -> Vec<TxTree> {
    build_merkle_layers(leaves).into_iter().flatten().collect()
}
