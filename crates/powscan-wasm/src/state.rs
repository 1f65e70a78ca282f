//! Configuration and result records exchanged with JavaScript.

use powscan_core::{AlgorithmVersion, CostParameters, ScanOutcome, ScanReport};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::error::BindingError;

fn default_version() -> u32 {
    AlgorithmVersion::V1_0.tag()
}

fn default_n() -> u32 {
    2048
}

fn default_r() -> u32 {
    8
}

/// Cost parameters as passed from JS. Missing fields take the Tidecoin
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Version tag: 5 (yespower 0.5) or 10 (yespower 1.0).
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_n")]
    pub n: u32,
    #[serde(default = "default_r")]
    pub r: u32,
    /// Hex-encoded personalization string.
    #[serde(default)]
    pub pers: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            version: default_version(),
            n: default_n(),
            r: default_r(),
            pers: None,
        }
    }
}

impl ScanConfig {
    /// Validated cost parameters for this config.
    pub fn to_params(&self) -> Result<CostParameters, BindingError> {
        let version = AlgorithmVersion::from_tag(self.version)
            .ok_or(BindingError::UnknownVersion(self.version))?;
        let mut params = CostParameters::new(version, self.n, self.r);
        if let Some(pers) = &self.pers {
            let bytes = hex::decode(pers).map_err(|_| BindingError::InvalidPersonalization)?;
            params = params.with_personalization(bytes);
        }
        params
            .validate()
            .map_err(|e| BindingError::Config(e.to_string()))?;
        Ok(params)
    }
}

/// Algorithm parameters reported to JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmParams {
    pub version: u32,
    pub n: u32,
    pub r: u32,
}

impl AlgorithmParams {
    pub fn from_params(params: &CostParameters) -> Self {
        AlgorithmParams {
            version: params.version.tag(),
            n: params.n,
            r: params.r,
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self)
            .map_err(|e| BindingError::Serialization(format!("{:?}", e)).into())
    }
}

/// Result of one scan call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResultInfo {
    /// 1 found, 0 exhausted, -1 oracle error.
    pub status: i32,
    pub found: bool,
    /// The winning nonce (if found).
    pub nonce: Option<u32>,
    /// Raw digest bytes as hex (if found).
    pub hash: Option<String>,
    /// Oracle failure message (if any).
    pub error: Option<String>,
    /// Hashes computed by this call.
    pub hashes_done: u64,
}

impl ScanResultInfo {
    pub fn from_report(report: &ScanReport) -> Self {
        let error = match &report.outcome {
            ScanOutcome::OracleFailure(e) => Some(e.to_string()),
            _ => None,
        };
        ScanResultInfo {
            status: report.status_code(),
            found: report.is_found(),
            nonce: report.nonce(),
            hash: report.digest().map(|d| d.to_hex()),
            error,
            hashes_done: report.hashes_done,
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self)
            .map_err(|e| BindingError::Serialization(format!("{:?}", e)).into())
    }
}

/// Totals across every scan a `Scanner` has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total hashes computed.
    pub total_hashes: u64,
    /// Number of scan calls.
    pub scans: u32,
    /// Number of scans that found a nonce.
    pub found: u32,
    /// Number of scans aborted by the oracle.
    pub failures: u32,
    /// Wall time spent scanning in milliseconds.
    pub elapsed_ms: f64,
    /// Hashes per second over `elapsed_ms`; 0 until time is recorded.
    pub hash_rate: f64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one scan report into the totals.
    pub fn record(&mut self, report: &ScanReport) {
        self.total_hashes += report.hashes_done;
        self.scans += 1;
        match report.outcome {
            ScanOutcome::Found { .. } => self.found += 1,
            ScanOutcome::OracleFailure(_) => self.failures += 1,
            ScanOutcome::NotFound => {}
        }
    }

    /// Add the wall time of one scan and refresh `hash_rate`.
    pub fn add_elapsed(&mut self, elapsed_ms: f64) {
        if elapsed_ms > 0.0 {
            self.elapsed_ms += elapsed_ms;
        }
        if self.elapsed_ms > 0.0 {
            self.hash_rate = self.total_hashes as f64 * 1000.0 / self.elapsed_ms;
        }
    }

    /// `hash_rate` in H/s, or kH/s from 1000 H/s up.
    pub fn rate_display(&self) -> String {
        if self.hash_rate >= 1_000.0 {
            format!("{:.2} kH/s", self.hash_rate / 1_000.0)
        } else {
            format!("{:.1} H/s", self.hash_rate)
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self)
            .map_err(|e| BindingError::Serialization(format!("{:?}", e)).into())
    }
}
