//! Scan controller exposed to JavaScript.

use powscan_core::header::NONCE_OFFSET;
use powscan_core::{
    BlockHeader, CostParameters, NonceScanner, ScanOutcome, ScanReport, ScryptOracle, DIGEST_LEN,
};
use wasm_bindgen::prelude::*;

use crate::error::BindingError;
use crate::state::{AlgorithmParams, ScanConfig, ScanResultInfo, ScanStats};

/// A nonce scanner with fixed cost parameters.
///
/// Scratch memory is kept between `scan` calls, so slicing a large nonce
/// range into many small scans costs no extra allocations.
#[wasm_bindgen]
pub struct Scanner {
    /// Scanner and its scratch arena.
    inner: NonceScanner<ScryptOracle>,
    /// Cost parameters used for every hash.
    params: CostParameters,
    /// Hashes done by the most recent scan.
    hashes_done: u64,
    /// Outcome of the most recent scan.
    last: Option<ScanResultInfo>,
    /// Totals across scans.
    stats: ScanStats,
}

impl Scanner {
    pub fn with_params(params: CostParameters) -> Self {
        Scanner {
            inner: NonceScanner::new(ScryptOracle),
            params,
            hashes_done: 0,
            last: None,
            stats: ScanStats::new(),
        }
    }

    pub fn params(&self) -> &CostParameters {
        &self.params
    }

    /// Scan and, on success, write the winning nonce big-endian into the
    /// last four bytes of `header`. The header is untouched otherwise.
    pub fn scan_into(
        &mut self,
        header: &mut [u8],
        target: &[u8],
        start_nonce: u32,
        max_nonce: u32,
    ) -> Result<ScanReport, BindingError> {
        let report = self
            .inner
            .scan_bytes(header, target, start_nonce, max_nonce, &self.params)?;

        if let Some(nonce) = report.nonce() {
            header[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
        }

        self.hashes_done = report.hashes_done;
        self.stats.record(&report);
        self.last = Some(ScanResultInfo::from_report(&report));
        Ok(report)
    }

    /// Digest of `header` in the oracle's native byte layout.
    pub fn digest(&mut self, header: &[u8]) -> Result<[u8; DIGEST_LEN], BindingError> {
        let header = BlockHeader::from_slice(header)?;
        let digest = self.inner.compute(&header, &self.params)?;
        Ok(digest.0)
    }

    pub fn last_hashes_done(&self) -> u64 {
        self.hashes_done
    }

    pub fn last_info(&self) -> Option<&ScanResultInfo> {
        self.last.as_ref()
    }

    pub fn stats_ref(&self) -> &ScanStats {
        &self.stats
    }
}

#[wasm_bindgen]
impl Scanner {
    /// Create a scanner.
    ///
    /// # Arguments
    /// * `config` - `{ version, n, r, pers }`; omitted fields (or an omitted
    ///   object) use the Tidecoin parameters
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<Scanner, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            ScanConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<ScanConfig>(config)
                .map_err(|e| BindingError::Config(format!("{:?}", e)))?
        };
        Ok(Scanner::with_params(config.to_params()?))
    }

    /// Scan `start_nonce..=max_nonce`.
    ///
    /// # Returns
    /// 1 if a nonce was found (written into `header`), 0 if the range was
    /// exhausted, -1 if hashing failed.
    #[wasm_bindgen]
    pub fn scan(
        &mut self,
        header: &mut [u8],
        target: &[u8],
        start_nonce: u32,
        max_nonce: u32,
    ) -> Result<i32, JsValue> {
        let started = js_sys::Date::now();
        let report = self.scan_into(header, target, start_nonce, max_nonce)?;

        self.stats.add_elapsed(js_sys::Date::now() - started);

        match &report.outcome {
            ScanOutcome::Found { nonce, digest } => console_log(&format!(
                "Found nonce {} after {} hashes: {}",
                nonce,
                report.hashes_done,
                digest.to_display_hex()
            )),
            ScanOutcome::OracleFailure(e) => console_error(&format!(
                "Scan aborted at nonce {}: {}",
                start_nonce as u64 + report.hashes_done,
                e
            )),
            ScanOutcome::NotFound => {}
        }

        Ok(report.status_code())
    }

    /// Hash a single 80-byte header; returns 32 bytes.
    #[wasm_bindgen]
    pub fn compute_hash(&mut self, header: &[u8]) -> Result<Vec<u8>, JsValue> {
        Ok(self.digest(header)?.to_vec())
    }

    /// Hashes computed by the most recent scan.
    #[wasm_bindgen(getter)]
    pub fn hashes_done(&self) -> f64 {
        self.hashes_done as f64
    }

    /// Details of the most recent scan, or `undefined`.
    #[wasm_bindgen]
    pub fn last_result(&self) -> Result<JsValue, JsValue> {
        match &self.last {
            Some(info) => info.to_js(),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Totals across all scans.
    #[wasm_bindgen]
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        self.stats.to_js()
    }

    /// Hash rate across all scans, e.g. `"412.7 H/s"`.
    #[wasm_bindgen]
    pub fn hash_rate_display(&self) -> String {
        self.stats.rate_display()
    }

    /// Clear the totals and the last result. Scratch memory is kept.
    #[wasm_bindgen]
    pub fn reset_stats(&mut self) {
        self.stats = ScanStats::new();
        self.hashes_done = 0;
        self.last = None;
    }

    /// Scratch bytes held between scans.
    #[wasm_bindgen(getter)]
    pub fn scratch_bytes(&self) -> f64 {
        self.inner.scratch_capacity() as f64
    }

    /// `{ version, n, r }` of this scanner.
    #[wasm_bindgen]
    pub fn algorithm_params(&self) -> Result<JsValue, JsValue> {
        AlgorithmParams::from_params(&self.params).to_js()
    }
}

/// Log to the browser console.
#[wasm_bindgen]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}
