use crate::archive::central_header::CentralFileHeader;
use crate::archive::codec::expand_entry;
use crate::archive::end_record::EndOfCentralDirectory;
use crate::archive::entry::Entry;
use crate::archive::format::CompressionMethod;
use crate::archive::index::DirectoryIndex;
use crate::archive::local_header::LocalFileHeader;
use crate::archive::zip_archive::ZipArchive;
use crate::diagnostics::{Diagnostics, LOG_TARGET};
use crate::error::{Result, ZipError};
use crate::path::{base_name, output_path};
use crate::stream::MemoryFile;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Upper bound of the initial buffer for in-memory extraction
const PREALLOCATION_LIMIT: u64 = 16 * 1024 * 1024;

/// Deflate cannot expand input by more than this factor
const MAX_DEFLATE_RATIO: u64 = 1032;

/// Where an extracted entry ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractTarget {
    Disk,
    Memory,
}

/// Options for [`ZipArchive::extract_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Directory the output path is resolved against
    pub dest_dir: Option<PathBuf>,
    /// Keep the stored directory prefix (true) or only the base name
    pub keep_dir_structure: bool,
    /// Overwrite an existing file on disk
    pub replace_existing: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dest_dir: None,
            keep_dir_structure: true,
            replace_existing: false,
        }
    }
}

impl ExtractOptions {
    pub fn into_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dest_dir: Some(dir.into()),
            ..Self::default()
        }
    }
}

/// Result of an extraction
#[derive(Debug)]
pub enum ExtractedFile {
    OnDisk(PathBuf),
    InMemory(MemoryFile),
}

impl ExtractedFile {
    /// Read the whole payload, from disk if necessary
    pub fn contents(&self) -> Result<Vec<u8>> {
        match self {
            ExtractedFile::OnDisk(path) => Ok(fs::read(path)?),
            ExtractedFile::InMemory(file) => Ok(file.as_bytes().to_vec()),
        }
    }
}

/// Parse the central directory of an archive into a fresh index
///
/// Entries using general purpose flags or compression methods other than
/// stored and deflate are skipped with a warning. A name seen twice keeps the
/// first entry and logs an error.
pub(crate) fn read_directory<R: Read + Seek>(
    reader: &mut R,
    diagnostics: &dyn Diagnostics,
) -> Result<DirectoryIndex> {
    let (end_record, end_offset) = EndOfCentralDirectory::locate(reader)?;

    if end_record.disk_number != end_record.central_directory_disk {
        return Err(ZipError::MultiDisk {
            disk: end_record.disk_number,
            cd_disk: end_record.central_directory_disk,
        });
    }
    if end_record.entry_count == 0 {
        return Err(ZipError::EmptyCentralDirectory);
    }

    tracing::debug!(
        target: LOG_TARGET,
        entries = end_record.entry_count,
        cd_offset = end_record.central_directory_offset,
        end_offset,
        "reading central directory"
    );

    let mut index = DirectoryIndex::new();
    let mut offset = end_record.central_directory_offset as u64;

    for _ in 0..end_record.entry_count {
        reader.seek(SeekFrom::Start(offset))?;
        let header = CentralFileHeader::read_from(&mut *reader).map_err(|err| match err {
            ZipError::InvalidSignature { record, .. } => ZipError::InvalidSignature { record, offset },
            other => other,
        })?;
        let (name, extra, comment) = header.read_fields(&mut *reader)?;
        let record_offset = offset;
        offset += header.total_size();

        let display_name = String::from_utf8_lossy(&name).into_owned();
        if header.flags != 0 {
            diagnostics.warn(&format!(
                "skipping {}: general purpose flag {:#06x} is not supported",
                display_name, header.flags
            ));
            continue;
        }
        if let Err(err) = CompressionMethod::from_u16(header.compression_method) {
            diagnostics.warn(&format!("skipping {}: {}", display_name, err));
            continue;
        }
        let name = match String::from_utf8(name) {
            Ok(name) => name,
            Err(_) => {
                diagnostics.warn(&format!(
                    "skipping entry at offset {}: name is not valid UTF-8",
                    record_offset
                ));
                continue;
            }
        };

        let entry = Entry::from_central(name, header, extra, comment)?;
        if !index.insert_or_replace(entry, false) {
            diagnostics.error(&format!(
                "duplicate entry {} in central directory, keeping the first",
                display_name
            ));
        }
    }

    Ok(index)
}

impl ZipArchive {
    /// Read the archive file into the index, or start empty if it is missing
    pub(crate) fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let file = File::open(&self.path).map_err(|err| {
                self.diagnostics
                    .error(&format!("cannot open {}: {}", self.path.display(), err));
                err
            })?;
            let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
            let index = read_directory(&mut reader, self.diagnostics.as_ref()).map_err(|err| {
                self.diagnostics
                    .error(&format!("cannot read {}: {}", self.path.display(), err));
                err
            })?;

            self.handle = Some(reader);
            self.index = index;
            self.exists = true;
        } else {
            self.handle = None;
            self.index.clear();
            self.exists = false;
        }

        self.is_open = true;
        self.altered = false;
        tracing::debug!(
            target: LOG_TARGET,
            path = %self.path.display(),
            entries = self.index.len(),
            "archive opened"
        );
        Ok(())
    }

    /// Extract one saved entry to disk or memory
    pub fn extract_file(
        &mut self,
        name: &str,
        target: ExtractTarget,
        options: &ExtractOptions,
    ) -> Result<ExtractedFile> {
        self.ensure_open("extract")?;

        let result = self.extract_entry(name, target, options);
        if let Err(err) = &result {
            self.diagnostics
                .error(&format!("cannot extract {}: {}", name, err));
        }
        result
    }

    /// Extract every saved entry below `dir`, keeping directory structure
    ///
    /// Entries that cannot be extracted are skipped. Returns how many were
    /// written.
    pub fn extract_all<P: AsRef<Path>>(&mut self, dir: P, replace_existing: bool) -> Result<usize> {
        self.ensure_open("extract all")?;

        let dir = dir.as_ref();
        if !dir.is_dir() {
            self.diagnostics
                .error(&format!("extract all: {} is not a directory", dir.display()));
            return Err(ZipError::DirectoryNotFound(dir.to_path_buf()));
        }

        let options = ExtractOptions {
            dest_dir: Some(dir.to_path_buf()),
            keep_dir_structure: true,
            replace_existing,
        };

        let mut extracted = 0;
        for name in self.index.names() {
            if self.extract_file(&name, ExtractTarget::Disk, &options).is_ok() {
                extracted += 1;
            }
        }
        Ok(extracted)
    }

    fn extract_entry(
        &mut self,
        name: &str,
        target: ExtractTarget,
        options: &ExtractOptions,
    ) -> Result<ExtractedFile> {
        let entry = self
            .index
            .get(name)
            .ok_or_else(|| ZipError::EntryNotFound(name.to_string()))?;
        if entry.is_new {
            return Err(ZipError::EntryNotSaved(name.to_string()));
        }
        let header_offset = entry.local_header_offset;

        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| ZipError::HandleInvalid(format!("no file handle for {}", name)))?;

        let local = LocalFileHeader::read_at(handle, header_offset)?;
        if local.flags != 0 {
            return Err(ZipError::UnsupportedFeature {
                name: name.to_string(),
                flags: local.flags,
            });
        }
        let method = CompressionMethod::from_u16(local.compression_method)?;
        let payload_size = match method {
            CompressionMethod::Stored => local.uncompressed_size,
            CompressionMethod::Deflate => local.compressed_size,
        };
        if payload_size == 0 {
            return Err(ZipError::EmptyEntry(name.to_string()));
        }

        handle.seek(SeekFrom::Start(header_offset + local.total_size()))?;

        let buffer_size = self.config.buffer_size;
        let verify_crc = self.config.verify_crc;
        let check_crc = |actual: u32| -> Result<()> {
            if verify_crc && actual != local.crc32 {
                return Err(ZipError::CrcMismatch {
                    name: name.to_string(),
                    expected: local.crc32,
                    actual,
                });
            }
            Ok(())
        };

        match target {
            ExtractTarget::Memory => {
                // Declared sizes are untrusted; the vector grows past this if needed
                let reserve = (local.uncompressed_size as u64)
                    .min((local.compressed_size as u64).saturating_mul(MAX_DEFLATE_RATIO))
                    .min(PREALLOCATION_LIMIT);
                let mut data = Vec::with_capacity(reserve as usize);
                let crc = expand_entry(
                    method,
                    handle,
                    &mut data,
                    local.compressed_size as u64,
                    local.uncompressed_size as u64,
                    buffer_size,
                )?;
                check_crc(crc)?;

                let memory_name = if options.keep_dir_structure {
                    name
                } else {
                    base_name(name)
                };
                Ok(ExtractedFile::InMemory(MemoryFile::from_bytes(memory_name, data)))
            }
            ExtractTarget::Disk => {
                let out_path = output_path(name, options.dest_dir.as_deref(), options.keep_dir_structure)?;
                if out_path.exists() {
                    if !options.replace_existing {
                        return Err(ZipError::TargetExists(out_path));
                    }
                    self.diagnostics
                        .warn(&format!("overwriting {}", out_path.display()));
                }
                if options.keep_dir_structure {
                    if let Some(parent) = out_path.parent() {
                        if !parent.as_os_str().is_empty() {
                            fs::create_dir_all(parent)?;
                        }
                    }
                }

                let written = (|| -> Result<()> {
                    let mut out = BufWriter::with_capacity(buffer_size, File::create(&out_path)?);
                    let crc = expand_entry(
                        method,
                        handle,
                        &mut out,
                        local.compressed_size as u64,
                        local.uncompressed_size as u64,
                        buffer_size,
                    )?;
                    out.flush()?;
                    check_crc(crc)
                })();

                if let Err(err) = written {
                    let _ = fs::remove_file(&out_path);
                    return Err(err);
                }
                Ok(ExtractedFile::OnDisk(out_path))
            }
        }
    }
}
