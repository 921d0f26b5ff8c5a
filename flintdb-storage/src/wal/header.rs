//! WAL file header implementation.
//!
//! The header occupies a fixed 4096-byte, sector-aligned region at the
//! start of every WAL file so it can always be rewritten in a single
//! aligned write regardless of the underlying device's sector size.

use crate::format::{FileFormat, FileHeader as FileHeaderTrait, FileMetadata, ValidateFile};
use flintdb_core::magic::WAL_MAGIC;
use flintdb_core::{Error, Result};

use std::time::{SystemTime, UNIX_EPOCH};

/// Size of the WAL header region, 4 KiB aligned.
pub const WAL_HEADER_SIZE: usize = 4096;

const FIXED_FIELDS_SIZE: usize = 64;
const CURRENT_VERSION: u16 = 1;

/// The header block at offset 0 of a WAL file.
///
/// ## Binary layout (little-endian)
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic "WAL!"
/// 4       2     version
/// 6       2     reserved
/// 8       4     header_size (4096)
/// 12      4     reserved2
/// 16      8     timestamp (creation, microseconds since epoch)
/// 24      8     next_tx_id
/// 32      8     committed_offset
/// 40      8     checkpoint_offset
/// 48      8     total_count
/// 56      8     processed_count
/// 64      4032  zero padding
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalHeader {
    pub version: u16,
    pub timestamp: u64,
    pub next_tx_id: i64,
    pub committed_offset: i64,
    pub checkpoint_offset: i64,
    pub total_count: i64,
    pub processed_count: i64,
}

impl WalHeader {
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Self {
            version: CURRENT_VERSION,
            timestamp,
            next_tx_id: 1,
            committed_offset: WAL_HEADER_SIZE as i64,
            checkpoint_offset: WAL_HEADER_SIZE as i64,
            total_count: 0,
            processed_count: 0,
        }
    }
}

impl Default for WalHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileFormat for WalHeader {
    const MAGIC: &'static [u8] = WAL_MAGIC;
    const FORMAT_NAME: &'static str = "FlintDB write-ahead log";
    const CURRENT_VERSION: u16 = CURRENT_VERSION;
    const MIN_SUPPORTED_VERSION: u16 = 1;
}

impl FileHeaderTrait for WalHeader {
    const HEADER_SIZE: usize = WAL_HEADER_SIZE;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; WAL_HEADER_SIZE];
        buf[0..4].copy_from_slice(Self::MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&0u16.to_le_bytes());
        buf[8..12].copy_from_slice(&(WAL_HEADER_SIZE as u32).to_le_bytes());
        buf[12..16].copy_from_slice(&0u32.to_le_bytes());
        buf[16..24].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[24..32].copy_from_slice(&self.next_tx_id.to_le_bytes());
        buf[32..40].copy_from_slice(&self.committed_offset.to_le_bytes());
        buf[40..48].copy_from_slice(&self.checkpoint_offset.to_le_bytes());
        buf[48..56].copy_from_slice(&self.total_count.to_le_bytes());
        buf[56..64].copy_from_slice(&self.processed_count.to_le_bytes());
        buf
    }

    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < FIXED_FIELDS_SIZE {
            return Err(Error::InvalidHeader(format!(
                "WAL header too small: {} bytes (expected at least {})",
                data.len(),
                FIXED_FIELDS_SIZE
            )));
        }
        if &data[0..4] != Self::MAGIC {
            return Err(Error::InvalidHeader(
                "WAL header has wrong magic bytes".to_string(),
            ));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        let header_size = u32::from_le_bytes(data[8..12].try_into().unwrap());
        if header_size as usize != WAL_HEADER_SIZE {
            return Err(Error::InvalidHeader(format!(
                "WAL header_size {header_size} does not match expected {WAL_HEADER_SIZE}"
            )));
        }
        let timestamp = u64::from_le_bytes(data[16..24].try_into().unwrap());
        let next_tx_id = i64::from_le_bytes(data[24..32].try_into().unwrap());
        let committed_offset = i64::from_le_bytes(data[32..40].try_into().unwrap());
        let checkpoint_offset = i64::from_le_bytes(data[40..48].try_into().unwrap());
        let total_count = i64::from_le_bytes(data[48..56].try_into().unwrap());
        let processed_count = i64::from_le_bytes(data[56..64].try_into().unwrap());

        let header = Self {
            version,
            timestamp,
            next_tx_id,
            committed_offset,
            checkpoint_offset,
            total_count,
            processed_count,
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        if !self.is_version_supported() {
            return Err(Error::InvalidHeader(format!(
                "unsupported WAL version {}",
                self.version
            )));
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

impl ValidateFile for WalHeader {}

impl FileMetadata for WalHeader {
    fn created_at(&self) -> Option<u64> {
        Some(self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut header = WalHeader::new();
        header.next_tx_id = 42;
        header.committed_offset = 8192;
        header.checkpoint_offset = 4096;
        header.total_count = 100;
        header.processed_count = 99;

        let encoded = header.encode();
        assert_eq!(encoded.len(), WAL_HEADER_SIZE);
        let decoded = WalHeader::decode(&encoded).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut buf = vec![0u8; WAL_HEADER_SIZE];
        buf[0..4].copy_from_slice(b"NOPE");
        assert!(WalHeader::decode(&buf).is_err());
    }

    #[test]
    fn new_header_starts_past_its_own_region() {
        let header = WalHeader::new();
        assert_eq!(header.committed_offset, WAL_HEADER_SIZE as i64);
        assert_eq!(header.checkpoint_offset, WAL_HEADER_SIZE as i64);
        assert_eq!(header.next_tx_id, 1);
    }
}
