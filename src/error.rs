use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ZipError>;

/// Unified error type for all archive operations
#[derive(Debug, Error)]
pub enum ZipError {
    // Format errors
    #[error("Not a zip archive: end of central directory record not found")]
    NotAZipArchive,

    #[error("Invalid {record} signature at offset {offset}")]
    InvalidSignature { record: &'static str, offset: u64 },

    #[error("Multi-disk archives are not supported (disk {disk}, central directory on disk {cd_disk})")]
    MultiDisk { disk: u16, cd_disk: u16 },

    #[error("Central directory does not contain any entries")]
    EmptyCentralDirectory,

    // Unsupported features
    #[error("Entry {name} uses unsupported features (general purpose flag {flags:#06x})")]
    UnsupportedFeature { name: String, flags: u16 },

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    // Logic errors
    #[error("Archive is not open")]
    NotOpen,

    #[error("Archive is already open")]
    AlreadyOpen,

    #[error("Archive handle is invalid: {0}")]
    HandleInvalid(String),

    #[error("File not found in archive: {0}")]
    EntryNotFound(String),

    #[error("Entry {0} has not been saved yet")]
    EntryNotSaved(String),

    #[error("Entry {0} has no payload")]
    EmptyEntry(String),

    #[error("Target already exists: {0}")]
    TargetExists(PathBuf),

    // Record consistency
    #[error("Declared {field} length {declared} does not match actual length {actual}")]
    FieldLengthMismatch {
        field: &'static str,
        declared: usize,
        actual: usize,
    },

    // Format limits
    #[error("Name too long: {0} bytes (max 65535)")]
    NameTooLong(usize),

    #[error("Archive too large: {0}")]
    ArchiveTooLarge(String),

    #[error("Too many entries: {0} (max 65535)")]
    TooManyEntries(usize),

    // Codec errors
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("CRC mismatch for {name}: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    // Commit errors
    #[error("Failed to replace archive, new contents kept at {temp_path}: {source}")]
    CommitFailed {
        temp_path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Path errors
    #[error("Refusing to extract outside of target directory: {0}")]
    PathTraversal(String),

    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Source file does not exist: {0}")]
    SourceMissing(PathBuf),

    // Configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<toml::de::Error> for ZipError {
    fn from(err: toml::de::Error) -> Self {
        ZipError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ZipError {
    fn from(err: toml::ser::Error) -> Self {
        ZipError::Config(err.to_string())
    }
}
