//! Error types for decoding, addressing and path resolution.

use alloc::string::String;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, DagError>;

/// Everything that can go wrong while turning wire bytes into DAG nodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    /// Fewer bytes remain than the field requires.
    #[error("truncated input reading {field} at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A compact-size count or length does not fit the platform's address space.
    #[error("malformed count for {field} at offset {offset}: {value}")]
    MalformedCount {
        field: &'static str,
        offset: usize,
        value: u64,
    },

    /// The segwit marker/flag pair changed between peek and read.
    #[error("invalid segwit marker at offset {offset}: {marker:#04x} {flag:#04x}")]
    InvalidSegwitMarker { offset: usize, marker: u8, flag: u8 },

    /// Path resolution failed.
    #[error("no such path '{path}': {reason}")]
    PathNotFound { path: String, reason: &'static str },

    /// `resolve_link` reached a value that is not a link.
    #[error("value at '{path}' is not a link")]
    NotALink { path: String },

    /// Re-encoding a decoded header did not reproduce its input bytes.
    #[error("header re-encoding differs from input at offset {offset}")]
    StructuralMismatch { offset: usize },

    /// A detached merkle pair must be exactly two 32-byte hashes.
    #[error("invalid tx tree data: expected 64 bytes, got {0}")]
    InvalidTreeNodeLength(usize),

    /// A content identifier that is not a bitcoin block or tx address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The header's declared merkle root differs from the rebuilt tree.
    #[error("merkle root mismatch: header declares {declared}, transactions produce {computed}")]
    MerkleRootMismatch { declared: String, computed: String },

    /// A block without transactions has no merkle root to check.
    #[error("block contains no transactions")]
    NoTransactions,

    /// Bytes were left over after a standalone decode.
    #[error("trailing bytes: consumed {consumed} of {total}")]
    TrailingBytes { consumed: usize, total: usize },

    /// Input exceeds the configured size bound.
    #[error("message of {len} bytes exceeds limit of {limit}")]
    MessageTooLarge { len: usize, limit: usize },
}

impl DagError {
    pub(crate) fn path_not_found(path: &[&str], reason: &'static str) -> Self {
        DagError::PathNotFound {
            path: path.join("/"),
            reason,
        }
    }
}
