//! Serializable views of DAG nodes for JavaScript.

use btcdag_core::{DagNode, Link, Node, Resolved, TxInput, TxOutput};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// A link as seen from JS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Link name, if any.
    pub name: Option<String>,
    /// Target CID string.
    pub cid: String,
}

impl From<&Link> for LinkInfo {
    fn from(link: &Link) -> Self {
        LinkInfo {
            name: link.name.clone(),
            cid: link.address.to_string(),
        }
    }
}

/// Summary of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// "header", "transaction" or "tree".
    pub kind: String,
    /// CID string.
    pub cid: String,
    /// Hash in display byte order.
    pub hash: String,
    /// Canonical size in bytes.
    pub size: usize,
    /// Outgoing links.
    pub links: Vec<LinkInfo>,
}

impl NodeInfo {
    pub fn from_node(node: &Node) -> Self {
        let kind = match node {
            Node::Header(_) => "header",
            Node::Transaction(_) => "transaction",
            Node::Tree(_) => "tree",
        };
        let address = node.address();

        NodeInfo {
            kind: kind.to_string(),
            cid: address.to_string(),
            hash: address.display_hex(),
            size: node.size(),
            links: node.links().iter().map(LinkInfo::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputInfo {
    pub prev_tx: String,
    pub prev_index: u32,
    pub script: String,
    pub seq_no: u32,
}

impl From<&TxInput> for InputInfo {
    fn from(input: &TxInput) -> Self {
        InputInfo {
            prev_tx: input.prev_tx.to_string(),
            prev_index: input.prev_index,
            script: hex::encode(&input.script),
            seq_no: input.sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    pub value: u64,
    pub script: String,
}

impl From<&TxOutput> for OutputInfo {
    fn from(output: &TxOutput) -> Self {
        OutputInfo {
            value: output.value,
            script: hex::encode(&output.script),
        }
    }
}

/// The result of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResolvedInfo {
    Number { value: u64 },
    Bytes { hex: String },
    #[serde(rename_all = "camelCase")]
    Link { link: LinkInfo, remaining_path: String },
    Input { input: InputInfo },
    Inputs { inputs: Vec<InputInfo> },
    Output { output: OutputInfo },
    Outputs { outputs: Vec<OutputInfo> },
}

impl ResolvedInfo {
    pub fn new(resolved: &Resolved, rest: &[&str]) -> Self {
        match resolved {
            Resolved::U32(value) => ResolvedInfo::Number { value: *value as u64 },
            Resolved::U64(value) => ResolvedInfo::Number { value: *value },
            Resolved::Bytes(bytes) => ResolvedInfo::Bytes { hex: hex::encode(bytes) },
            Resolved::Link(link) => ResolvedInfo::Link {
                link: LinkInfo::from(link),
                remaining_path: rest.join("/"),
            },
            Resolved::Input(input) => ResolvedInfo::Input { input: input.into() },
            Resolved::Inputs(inputs) => ResolvedInfo::Inputs {
                inputs: inputs.iter().map(InputInfo::from).collect(),
            },
            Resolved::Output(output) => ResolvedInfo::Output { output: output.into() },
            Resolved::Outputs(outputs) => ResolvedInfo::Outputs {
                outputs: outputs.iter().map(OutputInfo::from).collect(),
            },
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        to_js(self)
    }
}

/// Convert any serializable view to a JS value.
pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}
