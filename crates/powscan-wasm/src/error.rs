//! Errors surfaced to JavaScript callers.

use powscan_core::{OracleError, ScanError};
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Anything a binding call can fail with before or during a scan.
#[derive(Debug, Error)]
pub enum BindingError {
    /// Malformed buffers, range or parameters; no hashing was done.
    #[error("{0}")]
    Scan(ScanError),
    /// The hash oracle failed.
    #[error("Hash computation failed: {0}")]
    Oracle(OracleError),
    #[error("Unknown algorithm version tag: {0}")]
    UnknownVersion(u32),
    #[error("Personalization must be hex encoded")]
    InvalidPersonalization,
    #[error("Invalid scan config: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ScanError> for BindingError {
    fn from(e: ScanError) -> Self {
        BindingError::Scan(e)
    }
}

impl From<OracleError> for BindingError {
    fn from(e: OracleError) -> Self {
        BindingError::Oracle(e)
    }
}

impl From<BindingError> for JsValue {
    fn from(e: BindingError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
