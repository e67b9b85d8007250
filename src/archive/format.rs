use crate::error::{Result, ZipError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

/// Local File Header signature (`PK\x03\x04`)
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Central Directory File Header signature (`PK\x01\x02`)
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;

/// End Of Central Directory Record signature (`PK\x05\x06`)
pub const END_RECORD_SIGNATURE: u32 = 0x0605_4b50;

/// Fixed part of a Local File Header
pub const LOCAL_HEADER_SIZE: usize = 30;

/// Fixed part of a Central Directory File Header
pub const CENTRAL_HEADER_SIZE: usize = 46;

/// End Of Central Directory Record without comment
pub const END_RECORD_SIZE: usize = 22;

/// Longest archive comment the format can carry
pub const MAX_COMMENT_SIZE: usize = 0xFFFF;

/// Version needed / made by: spec 2.0
pub const ZIP_VERSION: u16 = 0x0014;

/// Compression methods supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u16)]
pub enum CompressionMethod {
    Stored = 0,
    Deflate = 8,
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflate),
            _ => Err(ZipError::UnsupportedCompression(value)),
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// MS-DOS packed date and time, as stored in ZIP headers
///
/// Date: bits 9-15 year since 1980, 5-8 month, 0-4 day.
/// Time: bits 11-15 hour, 5-10 minute, 0-4 second / 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    pub fn new(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    /// Convert a system time (interpreted as UTC), clamped to 1980..=2107
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs(),
            Err(_) => 0,
        };

        let days = (secs / 86_400) as i64;
        let secs_of_day = secs % 86_400;
        let (year, month, day) = civil_from_days(days);

        if year < 1980 {
            return Self::new((1 << 5) | 1, 0);
        }
        if year > 2107 {
            return Self::new((127 << 9) | (12 << 5) | 31, (23 << 11) | (59 << 5) | 29);
        }

        let hour = (secs_of_day / 3600) as u16;
        let minute = ((secs_of_day % 3600) / 60) as u16;
        let second = (secs_of_day % 60) as u16;

        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
        let time = (hour << 11) | (minute << 5) | (second / 2);
        Self { date, time }
    }

    /// Decoded `(year, month, day)`
    pub fn ymd(&self) -> (u16, u8, u8) {
        let day = (self.date & 0x1F) as u8;
        let month = ((self.date >> 5) & 0x0F) as u8;
        let year = ((self.date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Decoded `(hour, minute, second)`
    pub fn hms(&self) -> (u8, u8, u8) {
        let second = ((self.time & 0x1F) * 2) as u8;
        let minute = ((self.time >> 5) & 0x3F) as u8;
        let hour = ((self.time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

// Helper functions for reading primitive types
pub(crate) fn read_u16<R: Read>(mut reader: R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(mut reader: R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Check that a variable-length field matches the length its header declares
pub(crate) fn check_length(field: &'static str, declared: u16, actual: &[u8]) -> Result<()> {
    if declared as usize != actual.len() {
        return Err(ZipError::FieldLengthMismatch {
            field,
            declared: declared as usize,
            actual: actual.len(),
        });
    }
    Ok(())
}
