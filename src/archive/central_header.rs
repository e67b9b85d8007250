use crate::archive::format::{
    check_length, read_u16, read_u32, DosDateTime, CENTRAL_HEADER_SIGNATURE, CENTRAL_HEADER_SIZE,
    ZIP_VERSION,
};
use crate::archive::local_header::LocalFileHeader;
use crate::error::{Result, ZipError};
use std::io::{Read, Write};

/// Central Directory File Header
///
/// One per entry in the central directory. Carries the same metadata as the
/// Local File Header plus the offset of that header in the archive.
///
/// Structure (46 bytes fixed, little-endian):
/// - Signature: `PK\x01\x02` (4 bytes)
/// - Version Made By / Version Needed: uint16 each
/// - General Purpose Flag: uint16
/// - Compression Method: uint16
/// - Last Mod Time / Date: uint16 each
/// - CRC32, Compressed Size, Uncompressed Size: uint32 each
/// - File Name / Extra Field / File Comment Length: uint16 each
/// - Disk Number Start: uint16
/// - Internal Attributes: uint16
/// - External Attributes: uint32
/// - Local Header Offset: uint32
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CentralFileHeader {
    pub version_made_by: u16,
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
    pub file_comment_length: u16,
    pub disk_number_start: u16,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    pub local_header_offset: u32,
}

impl CentralFileHeader {
    /// Mirror a Local File Header written at `local_header_offset`
    ///
    /// Extra field and comment are not carried over.
    pub fn from_local(local: &LocalFileHeader, local_header_offset: u32) -> Self {
        Self {
            version_made_by: ZIP_VERSION,
            version_needed: local.version_needed,
            flags: local.flags,
            compression_method: local.compression_method,
            last_mod_time: local.last_mod_time,
            last_mod_date: local.last_mod_date,
            crc32: local.crc32,
            compressed_size: local.compressed_size,
            uncompressed_size: local.uncompressed_size,
            file_name_length: local.file_name_length,
            extra_field_length: 0,
            file_comment_length: 0,
            disk_number_start: 0,
            internal_attributes: 0,
            external_attributes: 0,
            local_header_offset,
        }
    }

    /// Size of this record including its variable-length fields
    pub fn total_size(&self) -> u64 {
        CENTRAL_HEADER_SIZE as u64
            + self.file_name_length as u64
            + self.extra_field_length as u64
            + self.file_comment_length as u64
    }

    pub fn modified(&self) -> DosDateTime {
        DosDateTime::new(self.last_mod_date, self.last_mod_time)
    }

    /// Write the record followed by name, extra field and comment
    pub fn write_to<W: Write>(
        &self,
        mut writer: W,
        name: &[u8],
        extra: &[u8],
        comment: &[u8],
    ) -> Result<usize> {
        check_length("file name", self.file_name_length, name)?;
        check_length("extra field", self.extra_field_length, extra)?;
        check_length("file comment", self.file_comment_length, comment)?;

        let mut buf = [0u8; CENTRAL_HEADER_SIZE];
        buf[0..4].copy_from_slice(&CENTRAL_HEADER_SIGNATURE.to_le_bytes());
        buf[4..6].copy_from_slice(&self.version_made_by.to_le_bytes());
        buf[6..8].copy_from_slice(&self.version_needed.to_le_bytes());
        buf[8..10].copy_from_slice(&self.flags.to_le_bytes());
        buf[10..12].copy_from_slice(&self.compression_method.to_le_bytes());
        buf[12..14].copy_from_slice(&self.last_mod_time.to_le_bytes());
        buf[14..16].copy_from_slice(&self.last_mod_date.to_le_bytes());
        buf[16..20].copy_from_slice(&self.crc32.to_le_bytes());
        buf[20..24].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[24..28].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        buf[28..30].copy_from_slice(&self.file_name_length.to_le_bytes());
        buf[30..32].copy_from_slice(&self.extra_field_length.to_le_bytes());
        buf[32..34].copy_from_slice(&self.file_comment_length.to_le_bytes());
        buf[34..36].copy_from_slice(&self.disk_number_start.to_le_bytes());
        buf[36..38].copy_from_slice(&self.internal_attributes.to_le_bytes());
        buf[38..42].copy_from_slice(&self.external_attributes.to_le_bytes());
        buf[42..46].copy_from_slice(&self.local_header_offset.to_le_bytes());
        writer.write_all(&buf)?;

        let mut bytes_written = CENTRAL_HEADER_SIZE;
        for field in [name, extra, comment] {
            if !field.is_empty() {
                writer.write_all(field)?;
                bytes_written += field.len();
            }
        }
        Ok(bytes_written)
    }

    /// Read the fixed part from the current position
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let signature = read_u32(&mut reader)?;
        if signature != CENTRAL_HEADER_SIGNATURE {
            return Err(ZipError::InvalidSignature {
                record: "central directory file header",
                offset: 0,
            });
        }

        Ok(Self {
            version_made_by: read_u16(&mut reader)?,
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
            file_comment_length: read_u16(&mut reader)?,
            disk_number_start: read_u16(&mut reader)?,
            internal_attributes: read_u16(&mut reader)?,
            external_attributes: read_u32(&mut reader)?,
            local_header_offset: read_u32(&mut reader)?,
        })
    }

    /// Read name, extra field and comment following the fixed part
    pub fn read_fields<R: Read>(&self, mut reader: R) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
        let mut name = vec![0u8; self.file_name_length as usize];
        reader.read_exact(&mut name)?;
        let mut extra = vec![0u8; self.extra_field_length as usize];
        reader.read_exact(&mut extra)?;
        let mut comment = vec![0u8; self.file_comment_length as usize];
        reader.read_exact(&mut comment)?;
        Ok((name, extra, comment))
    }
}
