//! WebAssembly bindings for the powscan nonce scanner.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Scanning a nonce range of an 80-byte header against a 32-byte target
//! - Hashing a single header
//! - Reporting the algorithm parameters and buffer sizes

use powscan_core::{CostParameters, DIGEST_LEN, HEADER_LEN};
use wasm_bindgen::prelude::*;

pub mod error;
pub mod scanner;
pub mod state;

// Re-export main types for JS access
pub use error::BindingError;
pub use scanner::Scanner;

use state::AlgorithmParams;

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    format!("powscan-wasm {}", env!("CARGO_PKG_VERSION"))
}

/// Digest size in bytes.
#[wasm_bindgen]
pub fn hash_size() -> u32 {
    DIGEST_LEN as u32
}

/// Expected block header size in bytes.
#[wasm_bindgen]
pub fn block_size() -> u32 {
    HEADER_LEN as u32
}

/// Default algorithm parameters as `{ version, n, r }`.
#[wasm_bindgen]
pub fn algorithm_params() -> Result<JsValue, JsValue> {
    AlgorithmParams::from_params(&CostParameters::tidecoin()).to_js()
}

/// One-shot scan with the default parameters.
///
/// On success the winning nonce is written big-endian into the last four
/// bytes of `header`. Returns `{ status, found, nonce, hash, error,
/// hashes_done }`.
#[wasm_bindgen]
pub fn scan_hash(
    header: &mut [u8],
    target: &[u8],
    start_nonce: u32,
    max_nonce: u32,
) -> Result<JsValue, JsValue> {
    let mut scanner = Scanner::with_params(CostParameters::tidecoin());
    scanner.scan(header, target, start_nonce, max_nonce)?;
    scanner.last_result()
}

/// Hash a single 80-byte header with the default parameters.
///
/// The 32 returned bytes are in the hash's native little-endian layout.
#[wasm_bindgen]
pub fn compute_single_hash(header: &[u8]) -> Result<Vec<u8>, JsValue> {
    let mut scanner = Scanner::with_params(CostParameters::tidecoin());
    scanner.compute_hash(header)
}
