//! Difficulty targets, digests and the 256-bit threshold comparison.
//!
//! Both targets and digests are eight 32-bit limbs with limb 7 the most
//! significant. On the wire each limb is little-endian, so the 32 bytes read
//! as one little-endian 256-bit integer.

use crate::scan::ScanError;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Number of 32-bit limbs in a digest or target.
pub const LIMBS: usize = 8;

/// Index of the most significant limb.
pub const TOP_LIMB: usize = LIMBS - 1;

fn decode_limbs(bytes: &[u8; DIGEST_LEN]) -> [u32; LIMBS] {
    let mut limbs = [0u32; LIMBS];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(4)) {
        *limb = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    limbs
}

/// Inclusive upper bound a digest must not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    limbs: [u32; LIMBS],
}

impl Target {
    /// The easiest target: every digest is accepted.
    pub const MAX: Target = Target { limbs: [u32::MAX; LIMBS] };

    /// The hardest target: only the all-zero digest is accepted.
    pub const ZERO: Target = Target { limbs: [0; LIMBS] };

    pub fn from_limbs(limbs: [u32; LIMBS]) -> Self {
        Target { limbs }
    }

    /// Decode the 32-byte little-endian wire form.
    pub fn from_le_bytes(bytes: &[u8; DIGEST_LEN]) -> Self {
        Target { limbs: decode_limbs(bytes) }
    }

    /// Parse a target from a byte slice, rejecting anything but 32 bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ScanError> {
        let bytes: &[u8; DIGEST_LEN] = data
            .try_into()
            .map_err(|_| ScanError::TargetLength(data.len()))?;
        Ok(Self::from_le_bytes(bytes))
    }

    /// Parse the hex form of the little-endian wire bytes.
    pub fn from_hex(s: &str) -> Result<Self, ScanError> {
        let data = hex::decode(s).map_err(|_| ScanError::InvalidHex)?;
        Self::from_slice(&data)
    }

    /// Expand a compact "bits" value into a target.
    ///
    /// Target = mantissa * 256^(exponent - 3). Negative or zero-exponent
    /// encodings yield [`Target::ZERO`]; exponents above 32 saturate to
    /// [`Target::MAX`].
    pub fn from_compact(bits: u32) -> Self {
        let exponent = (bits >> 24) as usize;
        let mantissa = bits & 0x007F_FFFF;

        if bits & 0x0080_0000 != 0 || exponent == 0 || mantissa == 0 {
            return Target::ZERO;
        }
        if exponent > DIGEST_LEN {
            return Target::MAX;
        }

        // Little-endian bytes: the mantissa's low byte lands at exponent - 3.
        let mut bytes = [0u8; DIGEST_LEN];
        let mantissa_bytes = mantissa.to_le_bytes();
        for (i, byte) in mantissa_bytes.iter().take(3).enumerate() {
            let pos = exponent as isize - 3 + i as isize;
            if (0..DIGEST_LEN as isize).contains(&pos) {
                bytes[pos as usize] = *byte;
            }
        }
        Target::from_le_bytes(&bytes)
    }

    pub fn limbs(&self) -> &[u32; LIMBS] {
        &self.limbs
    }

    /// Most significant limb, used by the pre-filter.
    #[inline]
    pub fn top_word(&self) -> u32 {
        self.limbs[TOP_LIMB]
    }

    /// Little-endian wire bytes.
    pub fn to_le_bytes(&self) -> [u8; DIGEST_LEN] {
        let mut bytes = [0u8; DIGEST_LEN];
        for (chunk, limb) in bytes.chunks_exact_mut(4).zip(self.limbs.iter()) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        bytes
    }

    /// Cheap single-limb check deciding whether [`fulltest`] has to run.
    ///
    /// Never rejects a digest that `fulltest` would accept.
    #[inline]
    pub fn prefilter(&self, digest: &Digest) -> bool {
        digest.top_word() <= self.top_word()
    }

    /// Pre-filter, then the exact comparison.
    #[inline]
    pub fn accepts(&self, digest: &Digest) -> bool {
        self.prefilter(digest) && fulltest(&digest.words(), &self.limbs)
    }
}

impl From<[u8; DIGEST_LEN]> for Target {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Target::from_le_bytes(&bytes)
    }
}

/// Oracle output: 32 bytes in little-endian limb order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Limbs normalized for [`fulltest`].
    pub fn words(&self) -> [u32; LIMBS] {
        decode_limbs(&self.0)
    }

    /// Limb 7 decoded little-endian.
    #[inline]
    pub fn top_word(&self) -> u32 {
        let b = &self.0[TOP_LIMB * 4..];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Hex of the raw bytes.
    pub fn to_hex(&self) -> alloc::string::String {
        hex::encode(self.0)
    }

    /// Hex of the digest read as a big-endian number (most significant
    /// byte first), the way block explorers display it.
    pub fn to_display_hex(&self) -> alloc::string::String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }
}

/// Returns true when `hash <= target` as 256-bit integers.
///
/// Limbs are compared from index 7 down; the first differing limb decides.
/// Equal values are accepted.
#[inline]
pub fn fulltest(hash: &[u32; LIMBS], target: &[u32; LIMBS]) -> bool {
    for i in (0..LIMBS).rev() {
        if hash[i] > target[i] {
            return false;
        }
        if hash[i] < target[i] {
            return true;
        }
    }
    true
}
