//! Fetch raw blocks and transactions from a mempool.space style API.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::dag::{console_log, BlockDag};

/// Networks with a public block API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet4,
}

impl Network {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mainnet" | "main" => Some(Network::Mainnet),
            "testnet4" | "testnet" => Some(Network::Testnet4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet4 => "testnet4",
        }
    }

    pub fn api_base_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mempool.space/api",
            Network::Testnet4 => "https://mempool.space/testnet4/api",
        }
    }
}

/// Source of raw block and transaction bytes.
#[wasm_bindgen]
pub struct BlockSource {
    base_url: String,
    network: Network,
}

#[wasm_bindgen]
impl BlockSource {
    /// Create a source for the named network.
    #[wasm_bindgen(constructor)]
    pub fn new(network: &str) -> Result<BlockSource, JsValue> {
        let network = Network::from_name(network)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown network: {}", network)))?;

        Ok(BlockSource {
            base_url: network.api_base_url().to_string(),
            network,
        })
    }

    /// Point the source at a different API root.
    #[wasm_bindgen]
    pub fn with_base_url(network: &str, base_url: &str) -> Result<BlockSource, JsValue> {
        let mut source = BlockSource::new(network)?;
        source.base_url = base_url.trim_end_matches('/').to_string();
        Ok(source)
    }

    /// Get the current tip block hash.
    pub async fn get_tip_hash(&self) -> Result<String, JsValue> {
        let url = format!("{}/blocks/tip/hash", self.base_url);
        self.fetch_text(&url).await
    }

    /// Fetch a block by hash and decode it.
    pub async fn fetch_block(&self, hash: &str) -> Result<BlockDag, JsValue> {
        let url = format!("{}/block/{}/raw", self.base_url, hash);
        let raw = self.fetch_bytes(&url).await?;
        BlockDag::new(&raw)
    }

    /// Fetch the raw bytes of a transaction by txid.
    pub async fn fetch_raw_tx(&self, txid: &str) -> Result<js_sys::Uint8Array, JsValue> {
        let url = format!("{}/tx/{}/raw", self.base_url, txid);
        let raw = self.fetch_bytes(&url).await?;
        Ok(js_sys::Uint8Array::from(raw.as_slice()))
    }

    #[wasm_bindgen(getter)]
    pub fn network(&self) -> String {
        self.network.name().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch(&self, url: &str) -> Result<Response, JsValue> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(url, &opts)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            console_log(&format!("GET {} failed with {}", url, resp.status()));
            return Err(JsValue::from_str(&format!(
                "HTTP error: {}",
                resp.status()
            )));
        }

        Ok(resp)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, JsValue> {
        let resp = self.fetch(url).await?;
        let text = JsFuture::from(resp.text()?).await?;
        text.as_string()
            .ok_or_else(|| JsValue::from_str("Response is not a string"))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, JsValue> {
        let resp = self.fetch(url).await?;
        let buffer = JsFuture::from(resp.array_buffer()?).await?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}
