//! JS handle over a decoded block.

use btcdag_core::{
    decode_block_with, decode_tx_or_tree, parse_path, Address, BlockMessage, DagError, DagNode,
    DecodeOptions, Node,
};
use wasm_bindgen::prelude::*;

use crate::view::{to_js, NodeInfo, ResolvedInfo};

/// Largest block message accepted from JS.
const MAX_BLOCK_MESSAGE_LEN: usize = 32 * 1024 * 1024;

/// A decoded block whose nodes can be listed and walked by CID.
#[wasm_bindgen]
pub struct BlockDag {
    block: BlockMessage,
}

#[wasm_bindgen]
impl BlockDag {
    /// Decode a raw block message.
    #[wasm_bindgen(constructor)]
    pub fn new(raw: &[u8]) -> Result<BlockDag, JsValue> {
        let options = DecodeOptions::new().with_max_message_len(MAX_BLOCK_MESSAGE_LEN);
        let block = decode_block_with(raw, &options).map_err(to_js_error)?;

        console_log(&format!(
            "Decoded block {} with {} transactions",
            block.header.display_hex(),
            block.transactions.len()
        ));

        Ok(BlockDag { block })
    }

    /// Decode a block message given as hex.
    #[wasm_bindgen]
    pub fn from_hex(hex: &str) -> Result<BlockDag, JsValue> {
        let raw = hex::decode(hex.trim())
            .map_err(|e| JsValue::from_str(&format!("Invalid hex: {}", e)))?;
        BlockDag::new(&raw)
    }

    /// Block hash in display byte order.
    #[wasm_bindgen(getter)]
    pub fn block_hash(&self) -> String {
        self.block.header.display_hex()
    }

    /// CID of the header node.
    #[wasm_bindgen(getter)]
    pub fn header_cid(&self) -> String {
        self.block.header.address().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn tx_count(&self) -> usize {
        self.block.transactions.len()
    }

    #[wasm_bindgen(getter)]
    pub fn node_count(&self) -> usize {
        self.block.node_count()
    }

    /// Check the header's merkle root against the transactions.
    #[wasm_bindgen]
    pub fn verify_merkle_root(&self) -> Result<(), JsValue> {
        self.block.verify_merkle_root().map_err(to_js_error)
    }

    /// Summaries of every node: header, transactions, then tree pairs.
    #[wasm_bindgen]
    pub fn nodes(&self) -> Result<JsValue, JsValue> {
        let infos: Vec<NodeInfo> = self.block.nodes().iter().map(NodeInfo::from_node).collect();
        to_js(&infos)
    }

    /// Summary of the node with the given CID.
    #[wasm_bindgen]
    pub fn node(&self, cid: &str) -> Result<JsValue, JsValue> {
        let node = self.lookup(cid)?;
        to_js(&NodeInfo::from_node(&node))
    }

    /// Hex of the node's canonical bytes.
    #[wasm_bindgen]
    pub fn raw_hex(&self, cid: &str) -> Result<String, JsValue> {
        Ok(hex::encode(self.lookup(cid)?.raw_data()))
    }

    /// Resolve `path` inside a single node.
    ///
    /// A link result carries the unconsumed part of the path.
    #[wasm_bindgen]
    pub fn resolve(&self, cid: &str, path: &str) -> Result<JsValue, JsValue> {
        let node = self.lookup(cid)?;
        let segments = parse_path(path);
        let (resolved, rest) = node.resolve(&segments).map_err(to_js_error)?;
        ResolvedInfo::new(&resolved, rest).to_js()
    }

    /// Resolve `path` starting at `cid`, following links into other nodes
    /// of this block until a value is reached.
    #[wasm_bindgen]
    pub fn walk(&self, cid: &str, path: &str) -> Result<JsValue, JsValue> {
        let mut node = self.lookup(cid)?;
        let segments = parse_path(path);
        let mut rest: &[&str] = &segments;

        loop {
            let (resolved, remaining) = node.resolve(rest).map_err(to_js_error)?;
            let next = match resolved.as_link() {
                Some(link) if !remaining.is_empty() => self.block.get(&link.address),
                _ => None,
            };

            match next {
                Some(target) => {
                    node = target;
                    rest = remaining;
                }
                None => return ResolvedInfo::new(&resolved, remaining).to_js(),
            }
        }
    }

    /// Enumerate the paths under `path` in the node, up to `depth` levels.
    #[wasm_bindgen]
    pub fn tree(&self, cid: &str, path: &str, depth: usize) -> Result<JsValue, JsValue> {
        let node = self.lookup(cid)?;
        to_js(&node.tree(path, depth))
    }
}

impl BlockDag {
    fn lookup(&self, cid: &str) -> Result<Node, JsValue> {
        let address = Address::parse(cid).map_err(to_js_error)?;
        self.block
            .get(&address)
            .ok_or_else(|| JsValue::from_str(&format!("Node not in block: {}", cid)))
    }
}

/// Summarize a detached transaction or 64-byte merkle pair, such as the
/// bytes returned by `BlockSource::fetch_raw_tx`.
#[wasm_bindgen]
pub fn inspect_tx_node(raw: &[u8]) -> Result<JsValue, JsValue> {
    let node = decode_tx_or_tree(raw).map_err(to_js_error)?;
    to_js(&NodeInfo::from_node(&node))
}

/// Resolve `path` inside a detached transaction or merkle pair.
#[wasm_bindgen]
pub fn resolve_tx_node(raw: &[u8], path: &str) -> Result<JsValue, JsValue> {
    let node = decode_tx_or_tree(raw).map_err(to_js_error)?;
    let segments = parse_path(path);
    let (resolved, rest) = node.resolve(&segments).map_err(to_js_error)?;
    ResolvedInfo::new(&resolved, rest).to_js()
}

fn to_js_error(err: DagError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Log to the browser console.
#[wasm_bindgen]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
