//! ziparchive-rs: ZIP archive reader/writer with in-place modification
//!
//! Supports the classic ZIP layout (local file headers, central directory,
//! end of central directory record) with stored and raw deflate entries:
//! - Open existing archives, skipping entries that use unsupported features
//! - Queue files or in-memory streams for addition, remove entries
//! - Save by rewriting the archive through a scratch file and atomic rename
//! - Extract entries to disk or memory with CRC-32 verification
//!
//! # Example
//!
//! ```no_run
//! use ziparchive_rs::{ExtractOptions, ExtractTarget, ZipArchive};
//!
//! // Create (or open) an archive and add a file below "docs/"
//! let mut archive = ZipArchive::open("example.zip")?;
//! archive.add_file("notes.txt", "docs", false)?;
//! archive.save()?;
//!
//! // Read it back into memory
//! let extracted = archive.extract_file(
//!     "docs/notes.txt",
//!     ExtractTarget::Memory,
//!     &ExtractOptions::default(),
//! )?;
//! let data = extracted.contents()?;
//! # Ok::<(), ziparchive_rs::ZipError>(())
//! ```

// Core modules
pub mod archive;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod path;
pub mod stream;

// Re-export commonly used types
pub use archive::{
    CompressionMethod, DosDateTime, EntryInfo, ExtractOptions, ExtractTarget, ExtractedFile,
    ZipArchive,
};
pub use config::ArchiveConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Level, RecordingDiagnostics, TracingDiagnostics};
pub use error::{Result, ZipError};
pub use stream::{ByteStream, DiskFile, MemoryFile};
