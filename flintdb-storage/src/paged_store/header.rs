//! The file header block that occupies offset 0 of every paged store file.

use crate::format::{FileFormat, FileHeader as FileHeaderTrait, ValidateFile};
use flintdb_core::magic::PAGED_STORE_MAGIC;
use flintdb_core::{Error, Result};

/// Size of the fixed portion of the header, before any `extra_header_bytes`.
pub const FIXED_HEADER_SIZE: usize = 48;

/// Default payload size of a block, in bytes.
pub const DEFAULT_BLOCK_BYTES: u32 = 496;

const CURRENT_VERSION: u16 = 1;

/// The header block at offset 0 of a paged store file.
///
/// Occupies exactly one block (`block_bytes + block_header_bytes`); the
/// fixed fields below are followed by `extra_header_bytes` of caller-owned
/// bytes and then zero padding out to the block boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedStoreHeader {
    pub version: u16,
    pub block_bytes: u32,
    pub block_header_bytes: u32,
    pub count: i64,
    pub bytes: i64,
    pub free_head: i64,
    pub extra_header: Vec<u8>,
}

impl PagedStoreHeader {
    pub fn new(block_bytes: u32, block_header_bytes: u32, extra_header: Vec<u8>) -> Self {
        Self {
            version: CURRENT_VERSION,
            block_bytes,
            block_header_bytes,
            count: 0,
            bytes: 0,
            free_head: -1,
            extra_header,
        }
    }

    /// Total size of one block: the header prefix this struct occupies
    /// plus `block_bytes` of payload.
    pub fn block_size(&self) -> u64 {
        (self.block_bytes + self.block_header_bytes) as u64
    }
}

impl FileFormat for PagedStoreHeader {
    const MAGIC: &'static [u8] = PAGED_STORE_MAGIC;
    const FORMAT_NAME: &'static str = "FlintDB paged store";
    const CURRENT_VERSION: u16 = CURRENT_VERSION;
    const MIN_SUPPORTED_VERSION: u16 = 1;
}

impl FileHeaderTrait for PagedStoreHeader {
    const HEADER_SIZE: usize = FIXED_HEADER_SIZE;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; FIXED_HEADER_SIZE + self.extra_header.len()];
        buf[0..4].copy_from_slice(Self::MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&0u16.to_le_bytes());
        buf[8..12].copy_from_slice(&self.block_bytes.to_le_bytes());
        buf[12..16].copy_from_slice(&self.block_header_bytes.to_le_bytes());
        buf[16..24].copy_from_slice(&self.count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.bytes.to_le_bytes());
        buf[32..40].copy_from_slice(&self.free_head.to_le_bytes());
        buf[40..44].copy_from_slice(&(self.extra_header.len() as u32).to_le_bytes());
        buf[44..48].copy_from_slice(&0u32.to_le_bytes());
        buf[FIXED_HEADER_SIZE..].copy_from_slice(&self.extra_header);
        buf
    }

    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < FIXED_HEADER_SIZE {
            return Err(Error::InvalidHeader(format!(
                "paged store header too small: {} bytes (expected at least {})",
                data.len(),
                FIXED_HEADER_SIZE
            )));
        }
        if &data[0..4] != Self::MAGIC {
            return Err(Error::InvalidHeader(
                "paged store header has wrong magic bytes".to_string(),
            ));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        let block_bytes = u32::from_le_bytes(data[8..12].try_into().unwrap());
        let block_header_bytes = u32::from_le_bytes(data[12..16].try_into().unwrap());
        let count = i64::from_le_bytes(data[16..24].try_into().unwrap());
        let bytes = i64::from_le_bytes(data[24..32].try_into().unwrap());
        let free_head = i64::from_le_bytes(data[32..40].try_into().unwrap());
        let extra_len = u32::from_le_bytes(data[40..44].try_into().unwrap()) as usize;

        let extra_end = FIXED_HEADER_SIZE + extra_len;
        if data.len() < extra_end {
            return Err(Error::InvalidHeader(format!(
                "paged store header truncated: need {} bytes for extra header, have {}",
                extra_end,
                data.len()
            )));
        }
        let extra_header = data[FIXED_HEADER_SIZE..extra_end].to_vec();

        let header = Self {
            version,
            block_bytes,
            block_header_bytes,
            count,
            bytes,
            free_head,
            extra_header,
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        if !self.is_version_supported() {
            return Err(Error::InvalidHeader(format!(
                "unsupported paged store version {}",
                self.version
            )));
        }
        if self.block_bytes == 0 {
            return Err(Error::InvalidHeader(
                "block_bytes must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    fn magic(&self) -> &[u8] {
        Self::MAGIC
    }

    fn version(&self) -> u16 {
        self.version
    }
}

impl ValidateFile for PagedStoreHeader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut header = PagedStoreHeader::new(DEFAULT_BLOCK_BYTES, 16, vec![1, 2, 3]);
        header.count = 7;
        header.bytes = 900;
        header.free_head = 512;

        let encoded = header.encode();
        let decoded = PagedStoreHeader::decode(&encoded).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut buf = vec![0u8; FIXED_HEADER_SIZE];
        buf[0..4].copy_from_slice(b"NOPE");
        assert!(PagedStoreHeader::decode(&buf).is_err());
    }

    #[test]
    fn default_block_size_is_512() {
        let header = PagedStoreHeader::new(DEFAULT_BLOCK_BYTES, 16, Vec::new());
        assert_eq!(header.block_size(), 512);
    }
}
