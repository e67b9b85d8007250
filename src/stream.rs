//! Named byte streams used as entry sources and extraction results

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A named, seekable source of bytes
///
/// Streams added to an archive are read from their start when the archive
/// is saved; the name only contributes its final path component to the
/// stored entry name.
pub trait ByteStream: Read + Seek + Send {
    /// Name of the stream (a file name or path)
    fn name(&self) -> &str;

    /// Total size in bytes; the stream position is left unchanged
    fn size(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(position))?;
        Ok(end)
    }
}

/// In-memory file
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    cursor: Cursor<Vec<u8>>,
}

impl MemoryFile {
    /// Create an empty memory file
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_bytes(name, Vec::new())
    }

    /// Wrap existing bytes
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            cursor: Cursor::new(data),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl ByteStream for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }
}

/// On-disk file opened for reading
#[derive(Debug)]
pub struct DiskFile {
    name: String,
    path: PathBuf,
    file: File,
}

impl DiskFile {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            name: path.to_string_lossy().into_owned(),
            path,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for DiskFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl ByteStream for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
