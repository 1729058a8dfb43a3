//! Content addresses for block, transaction and merkle nodes.
//!
//! An [`Address`] is the double-SHA256 of a node's canonical bytes tagged
//! with the kind of node it names. It maps one-to-one onto a CIDv1 with the
//! `bitcoin-block` or `bitcoin-tx` codec and a `dbl-sha2-256` multihash.
//! Two addresses of different kinds never compare equal, even when their
//! digests do.

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

use cid::multihash::Multihash;
use cid::{Cid, Version};

use crate::error::{DagError, Result};
use crate::hash::{double_sha256, hash_to_display_hex};

/// Multicodec for a bitcoin block header.
pub const BITCOIN_BLOCK_CODEC: u64 = 0xb0;

/// Multicodec for a bitcoin transaction or merkle tree node.
pub const BITCOIN_TX_CODEC: u64 = 0xb1;

/// Multihash code for double SHA256.
pub const DBL_SHA2_256: u64 = 0x56;

/// Which address space a node lives in.
///
/// Transactions and merkle tree pairs share [`NodeKind::Tx`], matching the
/// wire convention where a tree node and a txid are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Block header.
    Block,
    /// Transaction or merkle tree pair.
    Tx,
}

impl NodeKind {
    /// The multicodec tag for this kind.
    pub fn codec(&self) -> u64 {
        match self {
            NodeKind::Block => BITCOIN_BLOCK_CODEC,
            NodeKind::Tx => BITCOIN_TX_CODEC,
        }
    }

    /// Look up a kind from its multicodec tag.
    pub fn from_codec(codec: u64) -> Option<Self> {
        match codec {
            BITCOIN_BLOCK_CODEC => Some(NodeKind::Block),
            BITCOIN_TX_CODEC => Some(NodeKind::Tx),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Block => "bitcoin-block",
            NodeKind::Tx => "bitcoin-tx",
        }
    }
}

/// A content address: node kind plus double-SHA256 digest (internal byte order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    kind: NodeKind,
    digest: [u8; 32],
}

impl Address {
    /// Address of `bytes` interpreted as a node of `kind`.
    pub fn compute(bytes: &[u8], kind: NodeKind) -> Self {
        Address {
            kind,
            digest: double_sha256(bytes),
        }
    }

    /// Tag an existing digest, e.g. a hash field read off the wire.
    pub fn from_digest(digest: [u8; 32], kind: NodeKind) -> Self {
        Address { kind, digest }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The raw digest in internal byte order, as it appears in encodings.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// The digest reversed and hex-encoded, as block explorers show it.
    pub fn display_hex(&self) -> String {
        hash_to_display_hex(&self.digest)
    }

    /// Convert to a CIDv1.
    pub fn to_cid(&self) -> Cid {
        let hash = Multihash::<64>::wrap(DBL_SHA2_256, &self.digest)
            .expect("a 32-byte digest always fits a 64-byte multihash");
        Cid::new_v1(self.kind.codec(), hash)
    }

    /// Interpret a CID as a bitcoin address.
    pub fn from_cid(cid: &Cid) -> Result<Self> {
        if cid.version() != Version::V1 {
            return Err(DagError::InvalidAddress("expected a CIDv1".into()));
        }

        let kind = NodeKind::from_codec(cid.codec()).ok_or_else(|| {
            DagError::InvalidAddress(format!("unsupported codec {:#x}", cid.codec()))
        })?;

        let hash = cid.hash();
        if hash.code() != DBL_SHA2_256 {
            return Err(DagError::InvalidAddress(format!(
                "unsupported hash function {:#x}",
                hash.code()
            )));
        }

        let digest: [u8; 32] = hash.digest().try_into().map_err(|_| {
            DagError::InvalidAddress(format!("digest must be 32 bytes, got {}", hash.digest().len()))
        })?;

        Ok(Address { kind, digest })
    }

    /// Parse a CID string such as the one produced by `Display`.
    pub fn parse(s: &str) -> Result<Self> {
        let cid = Cid::try_from(s).map_err(|e| DagError::InvalidAddress(e.to_string()))?;
        Address::from_cid(&cid)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cid())
    }
}
