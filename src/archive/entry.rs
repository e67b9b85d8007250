use crate::archive::central_header::CentralFileHeader;
use crate::archive::format::{CompressionMethod, DosDateTime};
use crate::archive::local_header::LocalFileHeader;
use crate::error::Result;
use crate::stream::ByteStream;
use std::fmt;
use std::path::PathBuf;

/// Where the payload of a not-yet-saved entry comes from
pub enum EntrySource {
    Path(PathBuf),
    Stream(Box<dyn ByteStream>),
}

impl fmt::Debug for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            EntrySource::Stream(stream) => f.debug_tuple("Stream").field(&stream.name()).finish(),
        }
    }
}

/// One archived file as tracked by the directory index
#[derive(Debug)]
pub struct Entry {
    pub name: String,
    pub source: Option<EntrySource>,
    pub method: CompressionMethod,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
    pub is_new: bool,
    /// Offset of the Local File Header; meaningful only when `!is_new`
    pub local_header_offset: u64,
    pub local_header: Option<LocalFileHeader>,
    pub central_header: CentralFileHeader,
}

impl Entry {
    /// Entry added through the mutation API, persisted on the next save
    pub fn pending(name: String, source: EntrySource, method: CompressionMethod) -> Self {
        Self {
            name,
            source: Some(source),
            method,
            extra: Vec::new(),
            comment: Vec::new(),
            is_new: true,
            local_header_offset: 0,
            local_header: None,
            central_header: CentralFileHeader::default(),
        }
    }

    /// Entry read from an existing central directory
    pub fn from_central(
        name: String,
        central_header: CentralFileHeader,
        extra: Vec<u8>,
        comment: Vec<u8>,
    ) -> Result<Self> {
        let method = CompressionMethod::from_u16(central_header.compression_method)?;
        Ok(Self {
            name,
            source: None,
            method,
            extra,
            comment,
            is_new: false,
            local_header_offset: central_header.local_header_offset as u64,
            local_header: None,
            central_header,
        })
    }

    /// Entry as it exists on disk after a save wrote it at `offset`
    pub fn committed(
        name: String,
        method: CompressionMethod,
        local_header: LocalFileHeader,
        central_header: CentralFileHeader,
        extra: Vec<u8>,
        comment: Vec<u8>,
        offset: u64,
    ) -> Self {
        Self {
            name,
            source: None,
            method,
            extra,
            comment,
            is_new: false,
            local_header_offset: offset,
            local_header: Some(local_header),
            central_header,
        }
    }

    pub fn info(&self) -> EntryInfo {
        let header = &self.central_header;
        EntryInfo {
            name: self.name.clone(),
            method: self.method,
            compressed_size: header.compressed_size as u64,
            uncompressed_size: header.uncompressed_size as u64,
            crc32: header.crc32,
            modified: header.modified(),
            local_header_offset: (!self.is_new).then_some(self.local_header_offset),
            is_new: self.is_new,
        }
    }
}

/// Entry metadata exposed to callers
///
/// Sizes, CRC and timestamp of an unsaved entry are zero until it is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub modified: DosDateTime,
    pub local_header_offset: Option<u64>,
    pub is_new: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZipError;
    use crate::stream::MemoryFile;

    #[test]
    fn test_pending_entry_info() {
        let entry = Entry::pending(
            "docs/a.txt".to_string(),
            EntrySource::Stream(Box::new(MemoryFile::from_bytes("a.txt", b"abc".to_vec()))),
            CompressionMethod::Stored,
        );
        let info = entry.info();
        assert!(info.is_new);
        assert_eq!(info.local_header_offset, None);
        assert_eq!(info.uncompressed_size, 0);
        assert!(format!("{:?}", entry.source).contains("a.txt"));
    }

    #[test]
    fn test_from_central() {
        let header = CentralFileHeader {
            compression_method: 8,
            crc32: 99,
            compressed_size: 10,
            uncompressed_size: 40,
            local_header_offset: 512,
            ..CentralFileHeader::default()
        };
        let entry = Entry::from_central("x.bin".to_string(), header, Vec::new(), Vec::new()).unwrap();
        assert!(!entry.is_new);
        assert_eq!(entry.local_header_offset, 512);

        let info = entry.info();
        assert_eq!(info.method, CompressionMethod::Deflate);
        assert_eq!(info.local_header_offset, Some(512));
        assert_eq!(info.uncompressed_size, 40);

        let unsupported = CentralFileHeader {
            compression_method: 12,
            ..CentralFileHeader::default()
        };
        assert!(matches!(
            Entry::from_central("y".to_string(), unsupported, Vec::new(), Vec::new()),
            Err(ZipError::UnsupportedCompression(12))
        ));
    }
}
