use crate::archive::format::{
    read_u16, read_u32, END_RECORD_SIGNATURE, END_RECORD_SIZE, MAX_COMMENT_SIZE,
};
use crate::error::{Result, ZipError};
use std::io::{Read, Seek, SeekFrom, Write};

/// End Of Central Directory Record (EOCD)
///
/// Located at the end of the archive, optionally followed by a comment of up
/// to 65535 bytes. Lets readers find the central directory without scanning
/// the whole file.
///
/// Structure (22 bytes fixed, little-endian):
/// - Signature: `PK\x05\x06` (4 bytes)
/// - Number Of This Disk: uint16
/// - Disk With Start Of Central Directory: uint16
/// - Entries In Central Directory On This Disk: uint16
/// - Entries In Central Directory: uint16
/// - Central Directory Size: uint32
/// - Central Directory Offset: uint32
/// - Comment Length: uint16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub central_directory_disk: u16,
    pub entries_on_disk: u16,
    pub entry_count: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub comment_length: u16,
}

impl EndOfCentralDirectory {
    /// Create a single-disk end record without comment
    pub fn new(entry_count: u16, central_directory_size: u32, central_directory_offset: u32) -> Self {
        Self {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: entry_count,
            entry_count,
            central_directory_size,
            central_directory_offset,
            comment_length: 0,
        }
    }

    /// Write the fixed 22-byte record
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        let mut buf = [0u8; END_RECORD_SIZE];
        buf[0..4].copy_from_slice(&END_RECORD_SIGNATURE.to_le_bytes());
        buf[4..6].copy_from_slice(&self.disk_number.to_le_bytes());
        buf[6..8].copy_from_slice(&self.central_directory_disk.to_le_bytes());
        buf[8..10].copy_from_slice(&self.entries_on_disk.to_le_bytes());
        buf[10..12].copy_from_slice(&self.entry_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.central_directory_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.central_directory_offset.to_le_bytes());
        buf[20..22].copy_from_slice(&self.comment_length.to_le_bytes());

        writer.write_all(&buf)?;
        Ok(END_RECORD_SIZE)
    }

    /// Read the fixed record from the current position
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let signature = read_u32(&mut reader)?;
        if signature != END_RECORD_SIGNATURE {
            return Err(ZipError::InvalidSignature {
                record: "end of central directory",
                offset: 0,
            });
        }

        Ok(Self {
            disk_number: read_u16(&mut reader)?,
            central_directory_disk: read_u16(&mut reader)?,
            entries_on_disk: read_u16(&mut reader)?,
            entry_count: read_u16(&mut reader)?,
            central_directory_size: read_u32(&mut reader)?,
            central_directory_offset: read_u32(&mut reader)?,
            comment_length: read_u16(&mut reader)?,
        })
    }

    /// Find the end record of an archive
    ///
    /// Tries the last 22 bytes first. Failing that, the trailing
    /// `min(len, 65535 + 22)` bytes are searched backward for the signature.
    /// Returns the record and its offset.
    pub fn locate<R: Read + Seek>(reader: &mut R) -> Result<(Self, u64)> {
        let len = reader.seek(SeekFrom::End(0))?;
        if len < END_RECORD_SIZE as u64 {
            return Err(ZipError::NotAZipArchive);
        }

        // Common case: no archive comment
        let candidate = len - END_RECORD_SIZE as u64;
        reader.seek(SeekFrom::Start(candidate))?;
        let mut fixed = [0u8; END_RECORD_SIZE];
        reader.read_exact(&mut fixed)?;
        if let Ok(record) = Self::read_from(&fixed[..]) {
            return Ok((record, candidate));
        }

        let window = len.min((MAX_COMMENT_SIZE + END_RECORD_SIZE) as u64);
        let start = len - window;
        reader.seek(SeekFrom::Start(start))?;
        let mut tail = vec![0u8; window as usize];
        reader.read_exact(&mut tail)?;

        let signature = END_RECORD_SIGNATURE.to_le_bytes();
        let last = tail.len() - END_RECORD_SIZE;
        for pos in (0..=last).rev() {
            if tail[pos..pos + 4] == signature {
                let record = Self::read_from(&tail[pos..pos + END_RECORD_SIZE])?;
                return Ok((record, start + pos as u64));
            }
        }

        Err(ZipError::NotAZipArchive)
    }
}
