//! Proof-of-work nonce search for 80-byte block headers hashed with a
//! memory-hard function.
//!
//! This crate provides:
//! - Header layout with a big-endian nonce word
//! - 256-bit target comparison ("fulltest") with a single-limb pre-filter
//! - 64-byte aligned scratch memory reused across scans
//! - The `HashOracle` seam and a scrypt oracle whose working set lives in
//!   that scratch memory
//! - A bounded, single-stream nonce scanner

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod arena;
pub mod header;
pub mod oracle;
pub mod params;
pub mod scan;
pub mod target;

pub use arena::{ScratchArena, ScratchRegion};
pub use header::{BlockHeader, HEADER_LEN};
pub use oracle::{compute_digest, HashOracle, OracleError, ScryptOracle};
pub use params::{AlgorithmVersion, CostParameters, ParamsError};
pub use scan::{NonceScanner, ScanError, ScanOutcome, ScanReport};
pub use target::{fulltest, Digest, Target, DIGEST_LEN};
