//! The graph-node contract shared by headers, transactions and merkle pairs.
//!
//! Each node kind implements [`DagNode`] independently. [`Node`] is the sum
//! type handed back by the block decoder so callers can match on kind.

use alloc::string::String;
use alloc::vec::Vec;

use crate::address::{Address, NodeKind};
use crate::error::{DagError, Result};
use crate::header::BlockHeader;
use crate::merkle::TxTree;
use crate::transaction::{Transaction, TxInput, TxOutput};

/// A reference to another node by address.
///
/// Resolving a link (fetching the node it points at) is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Optional human-readable name, e.g. `parent` or `inputs/0/prevTx`.
    pub name: Option<String>,
    /// Address of the target node.
    pub address: Address,
}

impl Link {
    pub fn named(name: impl Into<String>, address: Address) -> Self {
        Link {
            name: Some(name.into()),
            address,
        }
    }
}

/// What a path resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    U32(u32),
    U64(u64),
    Bytes(Vec<u8>),
    Link(Link),
    Input(TxInput),
    Inputs(Vec<TxInput>),
    Output(TxOutput),
    Outputs(Vec<TxOutput>),
}

impl Resolved {
    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Resolved::Link(link) => Some(link),
            _ => None,
        }
    }
}

/// Split a `/`- or `.`-separated path into segments, dropping empty ones.
pub fn parse_path(path: &str) -> Vec<&str> {
    path.split(|c| c == '/' || c == '.')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Capabilities every DAG node exposes.
pub trait DagNode {
    /// Which address space this node belongs to.
    fn kind(&self) -> NodeKind;

    /// Canonical bytes, the input to [`DagNode::address`].
    fn raw_data(&self) -> Vec<u8>;

    /// Content address, recomputed from the canonical bytes on every call.
    fn address(&self) -> Address {
        Address::compute(&self.raw_data(), self.kind())
    }

    /// Outgoing links.
    fn links(&self) -> Vec<Link>;

    /// Length of the canonical bytes.
    fn size(&self) -> usize {
        self.raw_data().len()
    }

    /// Resolve `path`, returning the value found and any segments left over
    /// after a link.
    fn resolve<'p>(&self, path: &'p [&'p str]) -> Result<(Resolved, &'p [&'p str])>;

    /// Like [`DagNode::resolve`] but the value must be a link.
    fn resolve_link<'p>(&self, path: &'p [&'p str]) -> Result<(Link, &'p [&'p str])> {
        match self.resolve(path)? {
            (Resolved::Link(link), rest) => Ok((link, rest)),
            _ => Err(DagError::NotALink {
                path: path.join("/"),
            }),
        }
    }

    /// Paths reachable below `path`, expanded at most `depth` levels.
    fn tree(&self, path: &str, depth: usize) -> Vec<String>;

    /// A copy of this node as a [`Node`].
    fn copy(&self) -> Node;

    /// The address digest in display byte order.
    fn display_hex(&self) -> String {
        self.address().display_hex()
    }
}

/// Finish a resolution at `consumed` segments.
///
/// Scalars and byte strings are terminal: any segments past them are an error.
pub(crate) fn terminal<'p>(
    value: Resolved,
    path: &'p [&'p str],
    consumed: usize,
) -> Result<(Resolved, &'p [&'p str])> {
    if path.len() > consumed {
        return Err(DagError::path_not_found(path, "cannot traverse into a value"));
    }
    Ok((value, &path[consumed..]))
}

/// Finish a resolution at a link, handing back the unconsumed segments.
pub(crate) fn link_at<'p>(
    link: Link,
    path: &'p [&'p str],
    consumed: usize,
) -> Result<(Resolved, &'p [&'p str])> {
    Ok((Resolved::Link(link), &path[consumed..]))
}

/// Parse `path[pos]` as an index into a sequence of `len` items.
pub(crate) fn parse_index(path: &[&str], pos: usize, len: usize) -> Result<usize> {
    let index: usize = path[pos]
        .parse()
        .map_err(|_| DagError::path_not_found(path, "index is not a number"))?;
    if index >= len {
        return Err(DagError::path_not_found(path, "index out of range"));
    }
    Ok(index)
}

/// Any node produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Header(BlockHeader),
    Transaction(Transaction),
    Tree(TxTree),
}

impl Node {
    pub fn as_header(&self) -> Option<&BlockHeader> {
        match self {
            Node::Header(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Node::Transaction(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&TxTree> {
        match self {
            Node::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn DagNode {
        match self {
            Node::Header(header) => header,
            Node::Transaction(tx) => tx,
            Node::Tree(tree) => tree,
        }
    }
}

impl DagNode for Node {
    fn kind(&self) -> NodeKind {
        self.inner().kind()
    }

    fn raw_data(&self) -> Vec<u8> {
        self.inner().raw_data()
    }

    fn links(&self) -> Vec<Link> {
        self.inner().links()
    }

    fn resolve<'p>(&self, path: &'p [&'p str]) -> Result<(Resolved, &'p [&'p str])> {
        self.inner().resolve(path)
    }

    fn tree(&self, path: &str, depth: usize) -> Vec<String> {
        self.inner().tree(path, depth)
    }

    fn copy(&self) -> Node {
        self.clone()
    }
}

impl From<BlockHeader> for Node {
    fn from(header: BlockHeader) -> Self {
        Node::Header(header)
    }
}

impl From<Transaction> for Node {
    fn from(tx: Transaction) -> Self {
        Node::Transaction(tx)
    }
}

impl From<TxTree> for Node {
    fn from(tree: TxTree) -> Self {
        Node::Tree(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("inputs/0/seqNo"), vec!["inputs", "0", "seqNo"]);
        assert_eq!(parse_path("/outputs/1/"), vec!["outputs", "1"]);
        assert_eq!(parse_path("inputs.2.prevTx"), vec!["inputs", "2", "prevTx"]);
        assert!(parse_path("").is_empty());
    }

    #[test]
    fn test_parse_index() {
        let path = ["inputs", "1"];
        assert_eq!(parse_index(&path, 1, 2).unwrap(), 1);

        let err = parse_index(&path, 1, 1).unwrap_err();
        assert!(matches!(err, DagError::PathNotFound { reason: "index out of range", .. }));

        let path = ["inputs", "first"];
        let err = parse_index(&path, 1, 5).unwrap_err();
        assert!(matches!(err, DagError::PathNotFound { reason: "index is not a number", .. }));
    }

    #[test]
    fn test_terminal_rejects_extra_segments() {
        let path = ["version", "extra"];
        assert!(terminal(Resolved::U32(1), &path, 1).is_err());

        let path = ["version"];
        let (value, rest) = terminal(Resolved::U32(1), &path, 1).unwrap();
        assert_eq!(value, Resolved::U32(1));
        assert!(rest.is_empty());
    }
}
