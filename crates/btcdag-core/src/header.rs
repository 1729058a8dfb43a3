//! Bitcoin block header decoding and serialization.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::address::{Address, NodeKind};
use crate::cursor::Cursor;
use crate::error::{DagError, Result};
use crate::node::{link_at, terminal, DagNode, Link, Node, Resolved};

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 80;

const HEADER_FIELDS: [&str; 6] = ["version", "timestamp", "difficulty", "nonce", "parent", "tx"];

/// A Bitcoin block header (80 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version.
    pub version: u32,
    /// Address of the previous block header.
    pub parent: Address,
    /// Address of the merkle root over all transactions.
    pub merkle_root: Address,
    /// Block timestamp (Unix time).
    pub timestamp: u32,
    /// Difficulty target in compact "bits" format.
    pub bits: u32,
    /// Nonce for proof of work.
    pub nonce: u32,
}

impl BlockHeader {
    /// Read a header from the cursor, consuming exactly 80 bytes.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let version = cursor.read_u32_le("version")?;
        let parent = cursor.read_array::<32>("prev_block")?;
        let merkle_root = cursor.read_array::<32>("merkle_root")?;
        let timestamp = cursor.read_u32_le("timestamp")?;
        let bits = cursor.read_u32_le("difficulty")?;
        let nonce = cursor.read_u32_le("nonce")?;

        Ok(BlockHeader {
            version,
            parent: Address::from_digest(parent, NodeKind::Block),
            merkle_root: Address::from_digest(merkle_root, NodeKind::Tx),
            timestamp,
            bits,
            nonce,
        })
    }

    /// Decode a header and check that re-encoding reproduces the input.
    ///
    /// A mismatch means the codec itself is broken, not that the input is bad.
    pub(crate) fn decode_checked(cursor: &mut Cursor<'_>) -> Result<Self> {
        let start = cursor.position();
        let original = cursor
            .peek(BLOCK_HEADER_SIZE)
            .unwrap_or_default();
        let header = BlockHeader::decode(cursor)?;

        let encoded = header.serialize();
        if let Some(i) = encoded.iter().zip(original).position(|(a, b)| a != b) {
            tracing::error!(offset = start + i, "block header re-encoding mismatch");
            return Err(DagError::StructuralMismatch { offset: start + i });
        }

        Ok(header)
    }

    /// Serialize the block header to 80 bytes.
    pub fn serialize(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut header = [0u8; BLOCK_HEADER_SIZE];

        // Version (4 bytes, little-endian)
        header[0..4].copy_from_slice(&self.version.to_le_bytes());

        // Previous block hash (32 bytes, internal byte order)
        header[4..36].copy_from_slice(self.parent.digest());

        // Merkle root (32 bytes)
        header[36..68].copy_from_slice(self.merkle_root.digest());

        // Timestamp (4 bytes, little-endian)
        header[68..72].copy_from_slice(&self.timestamp.to_le_bytes());

        // Bits (4 bytes, little-endian)
        header[72..76].copy_from_slice(&self.bits.to_le_bytes());

        // Nonce (4 bytes, little-endian)
        header[76..80].copy_from_slice(&self.nonce.to_le_bytes());

        header
    }
}

impl DagNode for BlockHeader {
    fn kind(&self) -> NodeKind {
        NodeKind::Block
    }

    fn raw_data(&self) -> Vec<u8> {
        self.serialize().to_vec()
    }

    fn links(&self) -> Vec<Link> {
        vec![
            Link::named("tx", self.merkle_root),
            Link::named("parent", self.parent),
        ]
    }

    fn resolve<'p>(&self, path: &'p [&'p str]) -> Result<(Resolved, &'p [&'p str])> {
        let Some(first) = path.first() else {
            return Err(DagError::path_not_found(path, "zero length path"));
        };

        match *first {
            "version" => terminal(Resolved::U32(self.version), path, 1),
            "timestamp" => terminal(Resolved::U32(self.timestamp), path, 1),
            "difficulty" => terminal(Resolved::U32(self.bits), path, 1),
            "nonce" => terminal(Resolved::U32(self.nonce), path, 1),
            "parent" => link_at(Link::named("parent", self.parent), path, 1),
            "tx" => link_at(Link::named("tx", self.merkle_root), path, 1),
            _ => Err(DagError::path_not_found(path, "no such link")),
        }
    }

    fn tree(&self, path: &str, depth: usize) -> Vec<String> {
        if depth == 0 || !path.is_empty() {
            return Vec::new();
        }
        HEADER_FIELDS.iter().map(|field| field.to_string()).collect()
    }

    fn copy(&self) -> Node {
        Node::Header(self.clone())
    }
}
