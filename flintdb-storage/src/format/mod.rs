//! Common traits for file formats in FlintDB.
//!
//! Both the paged store's file header and the WAL's file header implement
//! these so that open-time validation (magic, version, size) reads the
//! same way in both places.

use flintdb_core::{Error, Result};
use std::path::Path;

/// Core trait for all file formats with headers.
pub trait FileFormat: Sized {
    /// Magic bytes identifying this file type.
    const MAGIC: &'static [u8];

    /// Human-readable name for error messages.
    const FORMAT_NAME: &'static str;

    /// Current version of this format.
    const CURRENT_VERSION: u16;

    /// Minimum supported version for reading.
    const MIN_SUPPORTED_VERSION: u16;
}

/// Header operations for file formats.
pub trait FileHeader: FileFormat {
    /// Size of the header in bytes.
    const HEADER_SIZE: usize;

    /// Encodes the header to bytes (exactly `HEADER_SIZE` long).
    fn encode(&self) -> Vec<u8>;

    /// Decodes a header from bytes.
    fn decode(data: &[u8]) -> Result<Self>;

    /// Validates header integrity and version.
    fn validate(&self) -> Result<()>;

    /// Gets the magic bytes from this header.
    fn magic(&self) -> &[u8];

    /// Gets the version number.
    fn version(&self) -> u16;

    /// Checks if version is supported.
    fn is_version_supported(&self) -> bool {
        self.version() >= Self::MIN_SUPPORTED_VERSION && self.version() <= Self::CURRENT_VERSION
    }
}

/// File validation operations.
pub trait ValidateFile: FileHeader {
    /// Quickly validates a file header without reading the entire file.
    fn validate_file_header(path: &Path) -> Result<()> {
        use std::fs::File;
        use std::io::Read;

        let mut file = File::open(path)?;
        let mut header_bytes = vec![0u8; Self::HEADER_SIZE];
        file.read_exact(&mut header_bytes)?;

        let header = Self::decode(&header_bytes)?;
        header.validate()?;

        Ok(())
    }

    /// Gets the file type from a path's magic bytes (for error messages).
    fn identify_file(path: &Path) -> Result<String> {
        use std::fs::File;
        use std::io::Read;

        let mut file = File::open(path)?;
        let mut magic = vec![0u8; Self::MAGIC.len()];
        file.read_exact(&mut magic)?;

        if magic == Self::MAGIC {
            Ok(Self::FORMAT_NAME.to_string())
        } else {
            Err(Error::InvalidHeader(format!(
                "not a {} file (wrong magic bytes)",
                Self::FORMAT_NAME
            )))
        }
    }
}

/// File creation/identification metadata.
pub trait FileMetadata {
    /// Human-readable creation time, if the format tracks one.
    fn created_at(&self) -> Option<u64> {
        None
    }
}
