//! WebAssembly bindings for the Bitcoin block DAG decoder.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Decoding raw blocks into header, transaction and merkle nodes
//! - Resolving paths across nodes by CID
//! - Inspecting detached transactions and merkle pairs
//! - Fetching raw blocks from public APIs

use wasm_bindgen::prelude::*;

pub mod api;
pub mod dag;
pub mod view;

pub use api::{BlockSource, Network};
pub use dag::{inspect_tx_node, resolve_tx_node, BlockDag};

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
