//! Streaming payload codec
//!
//! Payloads move through fixed-size buffers so memory use does not grow with
//! entry size. Deflate output is raw (no zlib or gzip framing), as ZIP
//! requires.

use crate::archive::format::CompressionMethod;
use crate::diagnostics::LOG_TARGET;
use crate::error::{Result, ZipError};
use crc32fast::Hasher;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, BufReader, Read, Write};

/// Outcome of writing one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSummary {
    /// CRC-32 of the uncompressed bytes
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Counts bytes passing through to the wrapped writer
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn read_chunk<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match src.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Encode everything readable from `src` into `dst`
pub fn compress_entry<R: Read, W: Write>(
    method: CompressionMethod,
    src: &mut R,
    dst: &mut W,
    level: u32,
    buffer_size: usize,
) -> Result<PayloadSummary> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut hasher = Hasher::new();
    let mut uncompressed_size = 0u64;

    let compressed_size = match method {
        CompressionMethod::Stored => {
            let mut out = CountingWriter { inner: dst, count: 0 };
            loop {
                let n = read_chunk(src, &mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                uncompressed_size += n as u64;
                out.write_all(&buf[..n])?;
            }
            out.count
        }
        CompressionMethod::Deflate => {
            let out = CountingWriter { inner: dst, count: 0 };
            let mut encoder = DeflateEncoder::new(out, Compression::new(level.min(9)));
            loop {
                let n = read_chunk(src, &mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                uncompressed_size += n as u64;
                encoder
                    .write_all(&buf[..n])
                    .map_err(|e| ZipError::CompressionFailed(e.to_string()))?;
            }
            let out = encoder
                .finish()
                .map_err(|e| ZipError::CompressionFailed(e.to_string()))?;
            out.count
        }
    };

    let summary = PayloadSummary {
        crc32: hasher.finalize(),
        compressed_size,
        uncompressed_size,
    };
    tracing::debug!(
        target: LOG_TARGET,
        ?method,
        uncompressed = summary.uncompressed_size,
        compressed = summary.compressed_size,
        "payload encoded"
    );
    Ok(summary)
}

/// Decode one payload from `src` into `dst` and return the CRC-32 of the output
///
/// At most `compressed_size` bytes are consumed for deflate (`uncompressed_size`
/// for stored), and exactly `uncompressed_size` bytes must be produced.
pub fn expand_entry<R: Read, W: Write>(
    method: CompressionMethod,
    src: &mut R,
    dst: &mut W,
    compressed_size: u64,
    uncompressed_size: u64,
    buffer_size: usize,
) -> Result<u32> {
    let buffer_size = buffer_size.max(1);
    let mut buf = vec![0u8; buffer_size];
    let mut hasher = Hasher::new();
    let mut produced = 0u64;

    match method {
        CompressionMethod::Stored => {
            let mut limited = src.take(uncompressed_size);
            loop {
                let n = read_chunk(&mut limited, &mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                produced += n as u64;
                dst.write_all(&buf[..n])?;
            }
        }
        CompressionMethod::Deflate => {
            let input = BufReader::with_capacity(buffer_size, src.take(compressed_size));
            let mut decoder = DeflateDecoder::new(input).take(uncompressed_size);
            loop {
                let n = read_chunk(&mut decoder, &mut buf)
                    .map_err(|e| ZipError::DecompressionFailed(e.to_string()))?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                produced += n as u64;
                dst.write_all(&buf[..n])?;
            }
        }
    }

    if produced != uncompressed_size {
        return Err(ZipError::DecompressionFailed(format!(
            "expected {} bytes, got {}",
            uncompressed_size, produced
        )));
    }

    tracing::debug!(target: LOG_TARGET, ?method, bytes = produced, "payload decoded");
    Ok(hasher.finalize())
}

/// Copy exactly `len` raw bytes from `src` to `dst`
pub fn copy_raw<R: Read, W: Write>(src: &mut R, dst: &mut W, len: u64, buffer_size: usize) -> Result<()> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        src.read_exact(&mut buf[..want])?;
        dst.write_all(&buf[..want])?;
        remaining -= want as u64;
    }
    Ok(())
}
