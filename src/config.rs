//! Archive configuration
//!
//! Settings are plain data with sensible defaults and can be loaded from TOML:
//!
//! ```toml
//! buffer_size = 8192
//! compression_level = 9
//! default_compression = "deflate"
//! temp_suffix = ".tmp"
//! verify_crc = true
//! ```

use crate::archive::CompressionMethod;
use crate::error::{Result, ZipError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default size of the bounded (de)compression and copy buffers
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Default deflate level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Tunables for an open archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Size of the scratch buffers used while streaming payloads
    pub buffer_size: usize,

    /// Deflate level (0-9)
    pub compression_level: u32,

    /// Method used for entries added without an explicit method
    pub default_compression: CompressionMethod,

    /// Suffix of the scratch file written during save
    pub temp_suffix: String,

    /// Verify the CRC-32 of every extracted payload
    pub verify_crc: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            default_compression: CompressionMethod::Deflate,
            temp_suffix: ".tmp".to_string(),
            verify_crc: true,
        }
    }
}

impl ArchiveConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize this configuration to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Reject settings the archive engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(ZipError::Config("buffer_size must be greater than zero".to_string()));
        }
        if self.compression_level > 9 {
            return Err(ZipError::Config(format!(
                "compression_level must be within 0..=9, got {}",
                self.compression_level
            )));
        }
        if self.temp_suffix.is_empty() {
            return Err(ZipError::Config("temp_suffix must not be empty".to_string()));
        }
        Ok(())
    }
}
