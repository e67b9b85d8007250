use crate::archive::format::{
    check_length, read_u16, read_u32, CompressionMethod, DosDateTime, LOCAL_HEADER_SIGNATURE,
    LOCAL_HEADER_SIZE, ZIP_VERSION,
};
use crate::error::{Result, ZipError};
use std::io::{Read, Seek, SeekFrom, Write};

/// Local File Header
///
/// Immediately precedes an entry's payload. Only the fixed part is held here;
/// the name and extra field follow it on disk.
///
/// Structure (30 bytes fixed, little-endian):
/// - Signature: `PK\x03\x04` (4 bytes)
/// - Version Needed: uint16
/// - General Purpose Flag: uint16
/// - Compression Method: uint16
/// - Last Mod Time / Date: uint16 each (DOS format)
/// - CRC32: uint32
/// - Compressed Size: uint32
/// - Uncompressed Size: uint32
/// - File Name Length: uint16
/// - Extra Field Length: uint16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    /// Header for a freshly written entry: version 2.0, no flags, no extra field
    pub fn new(
        method: CompressionMethod,
        modified: DosDateTime,
        crc32: u32,
        compressed_size: u32,
        uncompressed_size: u32,
        file_name_length: u16,
    ) -> Self {
        Self {
            version_needed: ZIP_VERSION,
            flags: 0,
            compression_method: method.as_u16(),
            last_mod_time: modified.time,
            last_mod_date: modified.date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length: 0,
        }
    }

    /// Total on-disk size of the header including name and extra field
    pub fn total_size(&self) -> u64 {
        LOCAL_HEADER_SIZE as u64 + self.file_name_length as u64 + self.extra_field_length as u64
    }

    pub fn modified(&self) -> DosDateTime {
        DosDateTime::new(self.last_mod_date, self.last_mod_time)
    }

    /// Write the fixed part
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        let mut buf = [0u8; LOCAL_HEADER_SIZE];
        buf[0..4].copy_from_slice(&LOCAL_HEADER_SIGNATURE.to_le_bytes());
        buf[4..6].copy_from_slice(&self.version_needed.to_le_bytes());
        buf[6..8].copy_from_slice(&self.flags.to_le_bytes());
        buf[8..10].copy_from_slice(&self.compression_method.to_le_bytes());
        buf[10..12].copy_from_slice(&self.last_mod_time.to_le_bytes());
        buf[12..14].copy_from_slice(&self.last_mod_date.to_le_bytes());
        buf[14..18].copy_from_slice(&self.crc32.to_le_bytes());
        buf[18..22].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[22..26].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        buf[26..28].copy_from_slice(&self.file_name_length.to_le_bytes());
        buf[28..30].copy_from_slice(&self.extra_field_length.to_le_bytes());

        writer.write_all(&buf)?;
        Ok(LOCAL_HEADER_SIZE)
    }

    /// Write the fixed part followed by name and extra field
    ///
    /// Both variable fields must match the lengths declared in the header.
    pub fn write_with_fields<W: Write>(&self, mut writer: W, name: &[u8], extra: &[u8]) -> Result<usize> {
        check_length("file name", self.file_name_length, name)?;
        check_length("extra field", self.extra_field_length, extra)?;

        let mut bytes_written = self.write_to(&mut writer)?;
        if !name.is_empty() {
            writer.write_all(name)?;
            bytes_written += name.len();
        }
        if !extra.is_empty() {
            writer.write_all(extra)?;
            bytes_written += extra.len();
        }
        Ok(bytes_written)
    }

    /// Read the fixed part from the current position
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let signature = read_u32(&mut reader)?;
        if signature != LOCAL_HEADER_SIGNATURE {
            return Err(ZipError::InvalidSignature {
                record: "local file header",
                offset: 0,
            });
        }

        Ok(Self {
            version_needed: read_u16(&mut reader)?,
            flags: read_u16(&mut reader)?,
            compression_method: read_u16(&mut reader)?,
            last_mod_time: read_u16(&mut reader)?,
            last_mod_date: read_u16(&mut reader)?,
            crc32: read_u32(&mut reader)?,
            compressed_size: read_u32(&mut reader)?,
            uncompressed_size: read_u32(&mut reader)?,
            file_name_length: read_u16(&mut reader)?,
            extra_field_length: read_u16(&mut reader)?,
        })
    }

    /// Seek to `offset` and read the fixed part
    pub fn read_at<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Self> {
        reader.seek(SeekFrom::Start(offset))?;
        Self::read_from(reader).map_err(|err| match err {
            ZipError::InvalidSignature { record, .. } => ZipError::InvalidSignature { record, offset },
            other => other,
        })
    }

    /// Read the name and extra field that follow the fixed part
    pub fn read_fields<R: Read>(&self, mut reader: R) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut name = vec![0u8; self.file_name_length as usize];
        reader.read_exact(&mut name)?;
        let mut extra = vec![0u8; self.extra_field_length as usize];
        reader.read_exact(&mut extra)?;
        Ok((name, extra))
    }
}
