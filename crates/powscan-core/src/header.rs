//! Block header layout and nonce field encoding.

use crate::scan::ScanError;

/// Serialized header length in bytes (20 packed 32-bit words).
pub const HEADER_LEN: usize = 80;

/// Number of 32-bit words in a header.
pub const HEADER_WORDS: usize = HEADER_LEN / 4;

/// Index of the nonce word (the last one).
pub const NONCE_WORD: usize = HEADER_WORDS - 1;

/// Byte offset of the nonce field.
pub const NONCE_OFFSET: usize = NONCE_WORD * 4;

/// An 80-byte block header in the byte layout the hash oracle consumes.
///
/// Words 0..=18 are little-endian on the wire and are never touched by a
/// scan. Word 19 holds the nonce in big-endian order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    bytes: [u8; HEADER_LEN],
}

impl BlockHeader {
    /// Wrap an already-sized header buffer.
    pub fn new(bytes: [u8; HEADER_LEN]) -> Self {
        BlockHeader { bytes }
    }

    /// Parse a header from a byte slice, rejecting anything but 80 bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ScanError> {
        let bytes: [u8; HEADER_LEN] = data
            .try_into()
            .map_err(|_| ScanError::HeaderLength(data.len()))?;
        Ok(BlockHeader { bytes })
    }

    /// Parse a header from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, ScanError> {
        let data = hex::decode(s).map_err(|_| ScanError::InvalidHex)?;
        Self::from_slice(&data)
    }

    /// Build a header from its 20 words, encoding each little-endian.
    ///
    /// The nonce word is re-encoded big-endian like [`set_nonce`] does.
    ///
    /// [`set_nonce`]: BlockHeader::set_nonce
    pub fn from_words(words: &[u32; HEADER_WORDS]) -> Self {
        let mut bytes = [0u8; HEADER_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        let mut header = BlockHeader { bytes };
        header.set_nonce(words[NONCE_WORD]);
        header
    }

    /// Raw header bytes, as handed to the oracle.
    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.bytes
    }

    /// Decode word `index` (0..=18) as little-endian.
    pub fn word(&self, index: usize) -> u32 {
        let offset = index * 4;
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }

    /// The nonce currently stored in the header.
    pub fn nonce(&self) -> u32 {
        u32::from_be_bytes([
            self.bytes[NONCE_OFFSET],
            self.bytes[NONCE_OFFSET + 1],
            self.bytes[NONCE_OFFSET + 2],
            self.bytes[NONCE_OFFSET + 3],
        ])
    }

    /// Store `nonce` big-endian in the last word.
    #[inline]
    pub fn set_nonce(&mut self, nonce: u32) {
        self.bytes[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
    }

    /// Copy of this header carrying `nonce`.
    pub fn with_nonce(&self, nonce: u32) -> Self {
        let mut header = *self;
        header.set_nonce(nonce);
        header
    }

    /// Hex encoding of the header bytes.
    pub fn to_hex(&self) -> alloc::string::String {
        hex::encode(self.bytes)
    }
}

impl From<[u8; HEADER_LEN]> for BlockHeader {
    fn from(bytes: [u8; HEADER_LEN]) -> Self {
        BlockHeader::new(bytes)
    }
}
