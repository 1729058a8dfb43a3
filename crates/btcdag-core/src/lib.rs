//! Decode Bitcoin blocks into a content-addressed DAG.
//!
//! This crate provides pure Rust implementations of:
//! - Compact-size integers and a peekable little-endian byte cursor
//! - Block header and transaction decoding (legacy and segwit)
//! - Canonical re-serialization for hashing
//! - Merkle tree reconstruction, one addressable node per internal pair
//! - Content addresses (double SHA256 tagged with the node kind, as CIDv1)
//! - Path resolution over headers, transactions and merkle pairs
//!
//! ```no_run
//! use btcdag_core::{decode_block, parse_path, DagNode};
//!
//! # fn run(raw_block: &[u8]) -> btcdag_core::Result<()> {
//! let block = decode_block(raw_block)?;
//! block.verify_merkle_root()?;
//!
//! let path = parse_path("inputs/0/seqNo");
//! let (sequence, _) = block.transactions[0].resolve(&path)?;
//! # let _ = sequence;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod address;
pub mod cursor;
pub mod decode;
pub mod error;
pub mod hash;
pub mod header;
pub mod merkle;
pub mod node;
pub mod transaction;
pub mod varint;

pub use address::{Address, NodeKind};
pub use decode::{
    decode_block, decode_block_message, decode_block_with, decode_header, decode_transaction,
    decode_tx_or_tree, decode_tx_tree, BlockMessage, DecodeOptions,
};
pub use error::{DagError, Result};
pub use hash::double_sha256;
pub use header::BlockHeader;
pub use merkle::{build_merkle_layers, build_merkle_tree, TxTree};
pub use node::{parse_path, DagNode, Link, Node, Resolved};
pub use transaction::{Transaction, TxInput, TxOutput, Witness};
