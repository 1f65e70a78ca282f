//! Nonce search over a bounded range.

use core::fmt;

use crate::arena::ScratchArena;
use crate::header::{BlockHeader, HEADER_LEN};
use crate::oracle::{HashOracle, OracleError};
use crate::params::{CostParameters, ParamsError};
use crate::target::{fulltest, Digest, Target, DIGEST_LEN};

/// A scan request that was rejected before any hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Header buffer is not 80 bytes.
    HeaderLength(usize),
    /// Target buffer is not 32 bytes.
    TargetLength(usize),
    /// Hex input could not be decoded.
    InvalidHex,
    /// start_nonce > max_nonce.
    InvalidRange { start: u32, max: u32 },
    /// Cost parameters failed validation.
    InvalidParams(ParamsError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::HeaderLength(len) => {
                write!(f, "Header must be {} bytes, got {}", HEADER_LEN, len)
            }
            ScanError::TargetLength(len) => {
                write!(f, "Target must be {} bytes, got {}", DIGEST_LEN, len)
            }
            ScanError::InvalidHex => write!(f, "Invalid hex encoding"),
            ScanError::InvalidRange { start, max } => {
                write!(f, "Start nonce {} is above max nonce {}", start, max)
            }
            ScanError::InvalidParams(e) => write!(f, "Invalid cost parameters: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScanError {}

impl From<ParamsError> for ScanError {
    fn from(e: ParamsError) -> Self {
        ScanError::InvalidParams(e)
    }
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// `nonce` produced `digest`, which the target accepts.
    Found { nonce: u32, digest: Digest },
    /// Every nonce in the range was tried.
    NotFound,
    /// The oracle failed; the scan stopped at the failing nonce.
    OracleFailure(OracleError),
}

/// Result of one scan call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Digests computed by this call only.
    pub hashes_done: u64,
}

impl ScanReport {
    fn found(nonce: u32, digest: Digest, hashes_done: u64) -> Self {
        ScanReport {
            outcome: ScanOutcome::Found { nonce, digest },
            hashes_done,
        }
    }

    fn not_found(hashes_done: u64) -> Self {
        ScanReport {
            outcome: ScanOutcome::NotFound,
            hashes_done,
        }
    }

    fn failed(err: OracleError, hashes_done: u64) -> Self {
        ScanReport {
            outcome: ScanOutcome::OracleFailure(err),
            hashes_done,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, ScanOutcome::Found { .. })
    }

    /// The winning nonce, if any.
    pub fn nonce(&self) -> Option<u32> {
        match self.outcome {
            ScanOutcome::Found { nonce, .. } => Some(nonce),
            _ => None,
        }
    }

    pub fn digest(&self) -> Option<&Digest> {
        match &self.outcome {
            ScanOutcome::Found { digest, .. } => Some(digest),
            _ => None,
        }
    }

    /// `header` with the winning nonce filled in.
    pub fn solved_header(&self, header: &BlockHeader) -> Option<BlockHeader> {
        self.nonce().map(|nonce| header.with_nonce(nonce))
    }

    /// Host-binding status code: 1 found, 0 exhausted, -1 oracle error.
    pub fn status_code(&self) -> i32 {
        match self.outcome {
            ScanOutcome::Found { .. } => 1,
            ScanOutcome::NotFound => 0,
            ScanOutcome::OracleFailure(_) => -1,
        }
    }
}

/// Drives the search for one stream of nonces.
///
/// The scanner owns its scratch arena, so scratch memory is allocated at
/// most once per scan (and usually once per scanner), never per nonce.
#[derive(Debug)]
pub struct NonceScanner<O> {
    oracle: O,
    arena: ScratchArena,
}

impl<O: HashOracle> NonceScanner<O> {
    pub fn new(oracle: O) -> Self {
        NonceScanner {
            oracle,
            arena: ScratchArena::new(),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Scratch bytes currently held for the oracle.
    pub fn scratch_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Search `start_nonce..=max_nonce` for a nonce whose digest is at or
    /// below `target`.
    ///
    /// `header` is not modified; a found nonce is reported in the returned
    /// [`ScanReport`]. Oracle failures end the scan immediately and are
    /// reported as [`ScanOutcome::OracleFailure`], with `hashes_done`
    /// counting the digests completed before the failure.
    pub fn scan(
        &mut self,
        header: &BlockHeader,
        target: &Target,
        start_nonce: u32,
        max_nonce: u32,
        params: &CostParameters,
    ) -> Result<ScanReport, ScanError> {
        if start_nonce > max_nonce {
            return Err(ScanError::InvalidRange {
                start: start_nonce,
                max: max_nonce,
            });
        }
        params.validate()?;

        let scratch = match self.arena.region(self.oracle.scratch_size(params)) {
            Ok(region) => region,
            Err(e) => return Ok(ScanReport::failed(e, 0)),
        };

        let mut work = *header;
        let htarg = target.top_word();
        let mut n = start_nonce;

        loop {
            work.set_nonce(n);

            let digest = match self.oracle.compute(work.as_bytes(), params, scratch) {
                Ok(digest) => digest,
                Err(e) => return Ok(ScanReport::failed(e, (n - start_nonce) as u64)),
            };

            if digest.top_word() <= htarg && fulltest(&digest.words(), target.limbs()) {
                return Ok(ScanReport::found(n, digest, hashes_between(start_nonce, n)));
            }

            if n == max_nonce {
                break;
            }
            n += 1;
        }

        Ok(ScanReport::not_found(hashes_between(start_nonce, max_nonce)))
    }

    /// Like [`scan`](Self::scan), from raw 80-byte header and 32-byte target
    /// buffers. Buffer sizes are checked before any hashing.
    pub fn scan_bytes(
        &mut self,
        header: &[u8],
        target: &[u8],
        start_nonce: u32,
        max_nonce: u32,
        params: &CostParameters,
    ) -> Result<ScanReport, ScanError> {
        let header = BlockHeader::from_slice(header)?;
        let target = Target::from_slice(target)?;
        self.scan(&header, &target, start_nonce, max_nonce, params)
    }

    /// Hash one header using the scanner's scratch arena.
    pub fn compute(
        &mut self,
        header: &BlockHeader,
        params: &CostParameters,
    ) -> Result<Digest, OracleError> {
        params.validate()?;
        let scratch = self.arena.region(self.oracle.scratch_size(params))?;
        self.oracle.compute(header.as_bytes(), params, scratch)
    }
}

/// Nonces in `start..=end`.
#[inline]
fn hashes_between(start: u32, end: u32) -> u64 {
    (end - start) as u64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ScratchRegion;
    use crate::oracle::ScryptOracle;
    use crate::params::AlgorithmVersion;
    use crate::target::LIMBS;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    /// Digest derived from the nonce alone: top limb = !nonce, rest = fill.
    ///
    /// Larger nonces give smaller digests, so a target built with
    /// [`accepting_from`] accepts exactly the nonces at or above a threshold.
    struct NonceOracle {
        fill: u32,
        calls: Cell<u64>,
        fail_at: Option<u32>,
        seen: RefCell<Vec<u32>>,
    }

    impl NonceOracle {
        fn new(fill: u32) -> Self {
            NonceOracle {
                fill,
                calls: Cell::new(0),
                fail_at: None,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing_at(nonce: u32) -> Self {
            NonceOracle {
                fail_at: Some(nonce),
                ..Self::new(0)
            }
        }
    }

    impl HashOracle for NonceOracle {
        fn scratch_size(&self, _params: &CostParameters) -> usize {
            64
        }

        fn compute(
            &self,
            header: &[u8; HEADER_LEN],
            _params: &CostParameters,
            scratch: &mut ScratchRegion,
        ) -> Result<Digest, OracleError> {
            assert!(scratch.aligned_size() >= 64);
            let nonce = BlockHeader::new(*header).nonce();
            self.calls.set(self.calls.get() + 1);
            self.seen.borrow_mut().push(nonce);
            if self.fail_at == Some(nonce) {
                return Err(OracleError::Allocation);
            }

            let mut digest = [0u8; DIGEST_LEN];
            for chunk in digest.chunks_exact_mut(4) {
                chunk.copy_from_slice(&self.fill.to_le_bytes());
            }
            digest[28..32].copy_from_slice(&(!nonce).to_le_bytes());
            Ok(Digest(digest))
        }
    }

    /// Asks for a configurable amount of scratch and counts its calls.
    struct SizedOracle {
        size: Cell<usize>,
        calls: Cell<u64>,
    }

    impl SizedOracle {
        fn new(size: usize) -> Self {
            SizedOracle {
                size: Cell::new(size),
                calls: Cell::new(0),
            }
        }
    }

    impl HashOracle for SizedOracle {
        fn scratch_size(&self, _params: &CostParameters) -> usize {
            self.size.get()
        }

        fn compute(
            &self,
            _header: &[u8; HEADER_LEN],
            _params: &CostParameters,
            scratch: &mut ScratchRegion,
        ) -> Result<Digest, OracleError> {
            assert!(scratch.aligned_size() >= self.size.get());
            self.calls.set(self.calls.get() + 1);
            Ok(Digest([0xFF; DIGEST_LEN]))
        }
    }

    fn params() -> CostParameters {
        CostParameters::new(AlgorithmVersion::V1_0, 16, 1)
    }

    fn header() -> BlockHeader {
        let mut words = [0u32; 20];
        words[0] = 0x00000001;
        BlockHeader::from_words(&words)
    }

    /// Top limb !nonce, lower limbs `rest`.
    fn accepting_from(nonce: u32, rest: u32) -> Target {
        let mut limbs = [rest; LIMBS];
        limbs[7] = !nonce;
        Target::from_limbs(limbs)
    }

    #[test]
    fn test_max_target_found_at_start() {
        let mut scanner = NonceScanner::new(ScryptOracle);
        let report = scanner
            .scan(&header(), &Target::MAX, 0, 0, &params())
            .unwrap();

        assert_eq!(report.nonce(), Some(0));
        assert_eq!(report.hashes_done, 1);
        assert_eq!(report.status_code(), 1);

        // The reported digest is the digest of the solved header
        let solved = report.solved_header(&header()).unwrap();
        let again = scanner.compute(&solved, &params()).unwrap();
        assert_eq!(report.digest(), Some(&again));
    }

    #[test]
    fn test_zero_target_exhausts_range() {
        let mut scanner = NonceScanner::new(ScryptOracle);
        let report = scanner
            .scan(&header(), &Target::ZERO, 0, 1000, &params())
            .unwrap();

        assert_eq!(report.outcome, ScanOutcome::NotFound);
        assert_eq!(report.hashes_done, 1001);
        assert_eq!(report.status_code(), 0);
    }

    #[test]
    fn test_single_nonce_range_calls_oracle_once() {
        let oracle = NonceOracle::new(u32::MAX);
        let mut scanner = NonceScanner::new(&oracle);
        let report = scanner
            .scan(&header(), &Target::ZERO, 5, 5, &params())
            .unwrap();

        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(*oracle.seen.borrow(), [5]);
        assert_eq!(report.hashes_done, 1);
    }

    #[test]
    fn test_found_nonce_and_hash_count() {
        let oracle = NonceOracle::new(0);
        let mut scanner = NonceScanner::new(&oracle);
        let report = scanner
            .scan(&header(), &accepting_from(7, 0), 3, 100, &params())
            .unwrap();

        // Digest equals the target at nonce 7
        assert_eq!(report.nonce(), Some(7));
        assert_eq!(report.hashes_done, 7 - 3 + 1);
        assert_eq!(oracle.calls.get(), 5);
    }

    #[test]
    fn test_prefilter_pass_but_fulltest_reject() {
        // At nonce 10 the top limbs tie but the lower limbs exceed the target
        let oracle = NonceOracle::new(2);
        let mut scanner = NonceScanner::new(&oracle);
        let target = accepting_from(10, 1);

        let report = scanner.scan(&header(), &target, 0, 10, &params()).unwrap();
        assert_eq!(report.outcome, ScanOutcome::NotFound);
        assert_eq!(report.hashes_done, 11);

        let report = scanner.scan(&header(), &target, 0, 20, &params()).unwrap();
        assert_eq!(report.nonce(), Some(11));
        assert_eq!(report.hashes_done, 12);
    }

    #[test]
    fn test_header_is_not_mutated() {
        let original = header().with_nonce(0xDEADBEEF);
        let oracle = NonceOracle::new(0);
        let mut scanner = NonceScanner::new(&oracle);
        let report = scanner
            .scan(&original, &accepting_from(3, 0), 0, 10, &params())
            .unwrap();

        assert_eq!(original.nonce(), 0xDEADBEEF);
        let solved = report.solved_header(&original).unwrap();
        assert_eq!(solved.nonce(), 3);
        assert_eq!(&solved.as_bytes()[..76], &original.as_bytes()[..76]);
    }

    #[test]
    fn test_oracle_failure_aborts() {
        let oracle = NonceOracle::failing_at(4);
        let mut scanner = NonceScanner::new(&oracle);
        let report = scanner
            .scan(&header(), &Target::ZERO, 0, 100, &params())
            .unwrap();

        assert_eq!(report.outcome, ScanOutcome::OracleFailure(OracleError::Allocation));
        assert_eq!(report.hashes_done, 4);
        assert_eq!(report.status_code(), -1);
        // Not retried, nothing after the failing nonce
        assert_eq!(oracle.calls.get(), 5);
        assert_eq!(oracle.seen.borrow().last(), Some(&4));
    }

    #[test]
    fn test_failure_on_first_nonce_counts_zero() {
        let oracle = NonceOracle::failing_at(9);
        let mut scanner = NonceScanner::new(&oracle);
        let report = scanner
            .scan(&header(), &Target::MAX, 9, 9, &params())
            .unwrap();
        assert_eq!(report.hashes_done, 0);
        assert!(!report.is_found());
    }

    #[test]
    fn test_range_split_matches_combined_scan() {
        let mut scanner = NonceScanner::new(ScryptOracle);
        let mut limbs = [u32::MAX; LIMBS];
        limbs[7] = 0x0FFF_FFFF;
        let target = Target::from_limbs(limbs);

        let combined = scanner.scan(&header(), &target, 0, 200, &params()).unwrap();

        for split in [0u32, 1, 17, 63, 100, 199] {
            let first = scanner.scan(&header(), &target, 0, split, &params()).unwrap();
            let nonce = match first.nonce() {
                Some(n) => Some(n),
                None => scanner
                    .scan(&header(), &target, split + 1, 200, &params())
                    .unwrap()
                    .nonce(),
            };
            assert_eq!(nonce, combined.nonce(), "split at {}", split);
        }
    }

    #[test]
    fn test_adjacent_ranges_cover_each_nonce_once() {
        let oracle = NonceOracle::new(u32::MAX);
        let mut scanner = NonceScanner::new(&oracle);

        let a = scanner.scan(&header(), &Target::ZERO, 100, 149, &params()).unwrap();
        let b = scanner.scan(&header(), &Target::ZERO, 150, 199, &params()).unwrap();

        assert_eq!(a.hashes_done + b.hashes_done, 100);
        assert_eq!(*oracle.seen.borrow(), (100..=199).collect::<Vec<u32>>());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let mut scanner = NonceScanner::new(ScryptOracle);
        let mut limbs = [u32::MAX; LIMBS];
        limbs[7] = 0x3FFF_FFFF;
        let target = Target::from_limbs(limbs);

        let first = scanner.scan(&header(), &target, 0, 200, &params()).unwrap();
        let second = scanner.scan(&header(), &target, 0, 200, &params()).unwrap();
        assert_eq!(first, second);

        let mut fresh = NonceScanner::new(ScryptOracle);
        let third = fresh.scan(&header(), &target, 0, 200, &params()).unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn test_max_nonce_at_u32_max_does_not_wrap() {
        let oracle = NonceOracle::new(u32::MAX);
        let mut scanner = NonceScanner::new(&oracle);
        let report = scanner
            .scan(&header(), &Target::ZERO, u32::MAX - 2, u32::MAX, &params())
            .unwrap();

        assert_eq!(report.outcome, ScanOutcome::NotFound);
        assert_eq!(report.hashes_done, 3);
        assert_eq!(*oracle.seen.borrow(), [u32::MAX - 2, u32::MAX - 1, u32::MAX]);
    }

    #[test]
    fn test_preconditions_fail_before_hashing() {
        let oracle = NonceOracle::new(0);
        let mut scanner = NonceScanner::new(&oracle);

        assert_eq!(
            scanner.scan(&header(), &Target::MAX, 10, 9, &params()),
            Err(ScanError::InvalidRange { start: 10, max: 9 })
        );
        assert_eq!(
            scanner.scan_bytes(&[0u8; 79], &[0xFF; 32], 0, 0, &params()),
            Err(ScanError::HeaderLength(79))
        );
        assert_eq!(
            scanner.scan_bytes(&[0u8; 80], &[0xFF; 33], 0, 0, &params()),
            Err(ScanError::TargetLength(33))
        );
        let bad = CostParameters::new(AlgorithmVersion::V1_0, 3, 1);
        assert_eq!(
            scanner.scan(&header(), &Target::MAX, 0, 0, &bad),
            Err(ScanError::InvalidParams(ParamsError::CostNotPowerOfTwo(3)))
        );
        assert_eq!(oracle.calls.get(), 0);
    }

    #[test]
    fn test_cost_too_large_for_block_size_rejected_up_front() {
        let mut scanner = NonceScanner::new(ScryptOracle);
        let bad = CostParameters::new(AlgorithmVersion::V1_0, 1 << 16, 1);

        assert_eq!(
            scanner.scan(&header(), &Target::MAX, 0, 0, &bad),
            Err(ScanError::InvalidParams(ParamsError::CostTooLarge {
                log_n: 16,
                r: 1
            }))
        );
        // Nothing was allocated for the rejected scan
        assert_eq!(scanner.scratch_capacity(), 0);
    }

    #[test]
    fn test_scratch_allocation_failure_reported() {
        let oracle = SizedOracle::new(usize::MAX);
        let mut scanner = NonceScanner::new(&oracle);

        let report = scanner
            .scan(&header(), &Target::MAX, 0, 100, &params())
            .unwrap();
        assert_eq!(report.outcome, ScanOutcome::OracleFailure(OracleError::Allocation));
        assert_eq!(report.hashes_done, 0);
        assert_eq!(report.status_code(), -1);
        assert_eq!(oracle.calls.get(), 0);
        assert_eq!(scanner.scratch_capacity(), 0);

        // A later scan with a sane request recovers
        oracle.size.set(4096);
        let report = scanner
            .scan(&header(), &Target::MAX, 0, 100, &params())
            .unwrap();
        assert_eq!(report.nonce(), Some(0));
        assert_eq!(report.hashes_done, 1);
        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(scanner.scratch_capacity(), 4096);
    }

    #[test]
    fn test_scrypt_working_set_held_by_arena() {
        let tidecoin = CostParameters::tidecoin();
        let mut scanner = NonceScanner::new(ScryptOracle);

        scanner.scan(&header(), &Target::ZERO, 0, 1, &tidecoin).unwrap();
        let capacity = scanner.scratch_capacity();
        assert!(capacity >= tidecoin.memory_bytes().unwrap());
        assert_eq!(capacity, ScryptOracle.scratch_size(&tidecoin));

        scanner.scan(&header(), &Target::ZERO, 2, 3, &tidecoin).unwrap();
        assert_eq!(scanner.scratch_capacity(), capacity);

        // Lighter parameters fit in the region already held
        scanner.scan(&header(), &Target::ZERO, 0, 3, &params()).unwrap();
        assert_eq!(scanner.scratch_capacity(), capacity);
    }

    #[test]
    fn test_scratch_reused_across_scans() {
        let oracle = NonceOracle::new(u32::MAX);
        let mut scanner = NonceScanner::new(&oracle);
        assert_eq!(scanner.scratch_capacity(), 0);

        scanner.scan(&header(), &Target::ZERO, 0, 10, &params()).unwrap();
        assert_eq!(scanner.scratch_capacity(), 64);
        scanner.scan(&header(), &Target::ZERO, 11, 20, &params()).unwrap();
        assert_eq!(scanner.scratch_capacity(), 64);
    }

    #[test]
    fn test_scan_bytes_uses_wire_layout() {
        let mut scanner = NonceScanner::new(ScryptOracle);
        let mut header_bytes = [0u8; 80];
        header_bytes[0..4].copy_from_slice(&1u32.to_le_bytes());

        let report = scanner
            .scan_bytes(&header_bytes, &[0xFF; 32], 0, 0, &params())
            .unwrap();
        assert_eq!(report.nonce(), Some(0));
        assert_eq!(report.hashes_done, 1);
    }
}
