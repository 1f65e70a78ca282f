//! The memory-hard hash seen as a black box.
//!
//! The scanner only needs `compute(header, params, scratch) -> digest`. How
//! the digest is mixed is up to the implementation; [`ScryptOracle`] is the
//! one shipped here.

use core::fmt;

use pbkdf2::pbkdf2_hmac;
use salsa20::cipher::typenum::U4;
use salsa20::cipher::StreamCipherCore;
use salsa20::SalsaCore;
use sha2::Sha256;

use crate::arena::ScratchRegion;
use crate::header::{BlockHeader, HEADER_LEN};
use crate::params::{CostParameters, ParamsError};
use crate::target::{Digest, DIGEST_LEN};

/// Salsa20 with 8 rounds (4 double rounds).
type Salsa20_8 = SalsaCore<U4>;

/// Why the oracle could not produce a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Scratch memory was missing, too small, or could not be allocated.
    Allocation,
    /// The transform rejected the cost parameters.
    Params(ParamsError),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Allocation => write!(f, "Scratch memory allocation failed"),
            OracleError::Params(e) => write!(f, "Invalid cost parameters: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OracleError {}

impl From<ParamsError> for OracleError {
    fn from(e: ParamsError) -> Self {
        OracleError::Params(e)
    }
}

/// A deterministic header hash backed by caller-provided scratch memory.
pub trait HashOracle {
    /// Scratch bytes `compute` expects in its region for `params`.
    fn scratch_size(&self, params: &CostParameters) -> usize;

    /// Hash one header. Must be a pure function of `header` and `params`.
    fn compute(
        &self,
        header: &[u8; HEADER_LEN],
        params: &CostParameters,
        scratch: &mut ScratchRegion,
    ) -> Result<Digest, OracleError>;
}

impl<O: HashOracle + ?Sized> HashOracle for &O {
    fn scratch_size(&self, params: &CostParameters) -> usize {
        (**self).scratch_size(params)
    }

    fn compute(
        &self,
        header: &[u8; HEADER_LEN],
        params: &CostParameters,
        scratch: &mut ScratchRegion,
    ) -> Result<Digest, OracleError> {
        (**self).compute(header, params, scratch)
    }
}

/// scrypt(header, salt, N, r, p = 1) with a 32-byte output.
///
/// The salt is the personalization string when one is set, otherwise the
/// header itself. The version tag is carried but not interpreted.
///
/// The whole working set lives in the scratch region, laid out as
/// `[ V: 128 * r * N | B: 128 * r | T: 128 * r ]`, so hashing a nonce never
/// touches the allocator. V starts at the aligned pointer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScryptOracle;

impl ScryptOracle {
    pub fn new() -> Self {
        ScryptOracle
    }
}

impl HashOracle for ScryptOracle {
    fn scratch_size(&self, params: &CostParameters) -> usize {
        params.scratch_bytes().unwrap_or(usize::MAX)
    }

    fn compute(
        &self,
        header: &[u8; HEADER_LEN],
        params: &CostParameters,
        scratch: &mut ScratchRegion,
    ) -> Result<Digest, OracleError> {
        params.validate()?;
        let needed = self.scratch_size(params);
        if scratch.is_empty() || scratch.aligned_size() < needed {
            return Err(OracleError::Allocation);
        }

        let block_len = 128 * params.r as usize;
        let (v, rest) = scratch.as_mut_slice()[..needed].split_at_mut(needed - 2 * block_len);
        let (b, t) = rest.split_at_mut(block_len);

        let salt: &[u8] = params.pers.as_deref().unwrap_or(&header[..]);
        pbkdf2_hmac::<Sha256>(header, salt, 1, b);
        ro_mix(b, v, t, params.n as usize);

        let mut digest = [0u8; DIGEST_LEN];
        pbkdf2_hmac::<Sha256>(header, b, 1, &mut digest);
        Ok(Digest(digest))
    }
}

/// Sequential memory-hard mix of `b` (128 * r bytes) through the table `v`
/// (N blocks of the same size). `t` is a temporary block.
fn ro_mix(b: &mut [u8], v: &mut [u8], t: &mut [u8], n: usize) {
    let len = b.len();

    for chunk in v.chunks_exact_mut(len) {
        chunk.copy_from_slice(b);
        block_mix(chunk, b);
    }

    for _ in 0..n {
        let j = integerify(b, n);
        for ((out, x), y) in t.iter_mut().zip(b.iter()).zip(&v[j * len..(j + 1) * len]) {
            *out = x ^ y;
        }
        block_mix(t, b);
    }
}

/// First word of the last 64-byte chunk, reduced mod N.
fn integerify(b: &[u8], n: usize) -> usize {
    let last = b.len() - 64;
    let mut word = [0u8; 4];
    word.copy_from_slice(&b[last..last + 4]);
    u32::from_le_bytes(word) as usize & (n - 1)
}

/// BlockMix with Salsa20/8. Even-indexed outputs go to the first half of
/// `output`, odd-indexed ones to the second half.
fn block_mix(input: &[u8], output: &mut [u8]) {
    let half = input.len() / 2;
    let mut x = [0u8; 64];
    x.copy_from_slice(&input[input.len() - 64..]);

    for (i, chunk) in input.chunks_exact(64).enumerate() {
        let mut state = [0u32; 16];
        for ((word, a), b) in state
            .iter_mut()
            .zip(x.chunks_exact(4))
            .zip(chunk.chunks_exact(4))
        {
            *word = u32::from_le_bytes([a[0] ^ b[0], a[1] ^ b[1], a[2] ^ b[2], a[3] ^ b[3]]);
        }
        Salsa20_8::from_raw_state(state).write_keystream_block((&mut x).into());

        let pos = (i / 2) * 64 + if i % 2 == 0 { 0 } else { half };
        output[pos..pos + 64].copy_from_slice(&x);
    }
}

/// Hash a single header with a freshly acquired scratch region.
///
/// The digest comes back in the oracle's native little-endian layout.
pub fn compute_digest<O: HashOracle + ?Sized>(
    oracle: &O,
    header: &BlockHeader,
    params: &CostParameters,
) -> Result<Digest, OracleError> {
    params.validate()?;
    let mut region = ScratchRegion::acquire(oracle.scratch_size(params));
    if region.is_empty() {
        return Err(OracleError::Allocation);
    }
    oracle.compute(header.as_bytes(), params, &mut region)
}
