//! Cost parameters for the memory-hard hash.

use alloc::vec::Vec;
use core::fmt;

/// Upper bound (exclusive) on r * p, with p = 1.
const MAX_BLOCK_SIZE: u32 = 1 << 30;

/// Algorithm revision of the memory-hard transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmVersion {
    /// yespower 0.5 (scrypt-compatible layout)
    V0_5,
    /// yespower 1.0
    V1_0,
}

impl AlgorithmVersion {
    /// Numeric tag used by host bindings.
    pub fn tag(&self) -> u32 {
        match self {
            AlgorithmVersion::V0_5 => 5,
            AlgorithmVersion::V1_0 => 10,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            5 => Some(AlgorithmVersion::V0_5),
            10 => Some(AlgorithmVersion::V1_0),
            _ => None,
        }
    }
}

/// Why a parameter set was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    /// N must be a power of two greater than one.
    CostNotPowerOfTwo(u32),
    /// r must be at least one.
    BlockSizeZero,
    /// 128 * r * N does not fit in memory.
    MemoryOverflow,
    /// log2(N) must stay below 16 * r.
    CostTooLarge { log_n: u8, r: u32 },
    /// r * p must stay below 2^30.
    BlockSizeTooLarge(u32),
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::CostNotPowerOfTwo(n) => {
                write!(f, "Cost factor N must be a power of two > 1, got {}", n)
            }
            ParamsError::BlockSizeZero => write!(f, "Block size factor r must be at least 1"),
            ParamsError::MemoryOverflow => write!(f, "128 * r * N overflows the address space"),
            ParamsError::CostTooLarge { log_n, r } => {
                write!(f, "log2(N) = {} must be below 16 * r = {}", log_n, 16 * *r as u64)
            }
            ParamsError::BlockSizeTooLarge(r) => {
                write!(f, "Block size factor r = {} must be below 2^30", r)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParamsError {}

/// Tunable cost of one hash: version, N, r and optional personalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostParameters {
    pub version: AlgorithmVersion,
    /// Cost factor N.
    pub n: u32,
    /// Block size factor r.
    pub r: u32,
    /// Personalization bytes, if any.
    pub pers: Option<Vec<u8>>,
}

impl CostParameters {
    pub fn new(version: AlgorithmVersion, n: u32, r: u32) -> Self {
        CostParameters {
            version,
            n,
            r,
            pers: None,
        }
    }

    /// Tidecoin mainnet parameters: yespower 1.0, N = 2048, r = 8.
    pub fn tidecoin() -> Self {
        Self::new(AlgorithmVersion::V1_0, 2048, 8)
    }

    pub fn with_personalization(mut self, pers: impl Into<Vec<u8>>) -> Self {
        self.pers = Some(pers.into());
        self
    }

    /// log2(N); only meaningful after [`validate`](Self::validate).
    pub fn log_n(&self) -> u8 {
        self.n.trailing_zeros() as u8
    }

    /// Working set of the transform in bytes: 128 * r * N.
    pub fn memory_bytes(&self) -> Option<usize> {
        128usize
            .checked_mul(self.r as usize)?
            .checked_mul(self.n as usize)
    }

    /// Scratch bytes one hash needs: the 128 * r * N table plus two
    /// 128 * r byte blocks.
    pub fn scratch_bytes(&self) -> Option<usize> {
        let block = 128usize.checked_mul(self.r as usize)?;
        self.memory_bytes()?.checked_add(block.checked_mul(2)?)
    }

    /// Check the parameters against the limits of the transform. The
    /// parallelism factor p is fixed at 1.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(ParamsError::CostNotPowerOfTwo(self.n));
        }
        if self.r == 0 {
            return Err(ParamsError::BlockSizeZero);
        }
        if self.r >= MAX_BLOCK_SIZE {
            return Err(ParamsError::BlockSizeTooLarge(self.r));
        }
        if self.log_n() as u64 >= 16 * self.r as u64 {
            return Err(ParamsError::CostTooLarge {
                log_n: self.log_n(),
                r: self.r,
            });
        }
        self.scratch_bytes().ok_or(ParamsError::MemoryOverflow)?;
        Ok(())
    }
}

impl Default for CostParameters {
    fn default() -> Self {
        Self::tidecoin()
    }
}
