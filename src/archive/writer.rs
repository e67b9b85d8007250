use crate::archive::central_header::CentralFileHeader;
use crate::archive::codec::{compress_entry, copy_raw};
use crate::archive::end_record::EndOfCentralDirectory;
use crate::archive::entry::{Entry, EntrySource};
use crate::archive::format::{DosDateTime, LOCAL_HEADER_SIZE};
use crate::archive::index::DirectoryIndex;
use crate::archive::local_header::LocalFileHeader;
use crate::archive::zip_archive::ZipArchive;
use crate::config::ArchiveConfig;
use crate::diagnostics::{Diagnostics, LOG_TARGET};
use crate::error::{Result, ZipError};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::{Builder, PersistError};

// Scratch files are created owner-only; a new archive gets the mode a
// plain file would get under the current umask.
#[cfg(unix)]
fn default_permissions(builder: &mut Builder<'_, '_>) {
    use std::os::unix::fs::PermissionsExt;
    builder.permissions(fs::Permissions::from_mode(0o666));
}

#[cfg(not(unix))]
fn default_permissions(_builder: &mut Builder<'_, '_>) {}

fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ZipError::ArchiveTooLarge(format!("{} {} exceeds 4 GiB", what, value)))
}

impl ZipArchive {
    /// Write all changes to disk
    ///
    /// Does nothing if nothing changed since the last open or save. The new
    /// archive is assembled in a scratch file next to the original and renamed
    /// over it; on failure the original file and the index are left as they
    /// were.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_open("save")?;
        if !self.altered {
            return Ok(());
        }

        if self.index.len() > u16::MAX as usize {
            let err = ZipError::TooManyEntries(self.index.len());
            self.diagnostics.error(&format!("save {}: {}", self.path.display(), err));
            return Err(err);
        }

        let result = self.write_and_commit();
        if let Err(err) = &result {
            self.diagnostics
                .error(&format!("save {} failed: {}", self.path.display(), err));
        }
        result
    }

    fn write_and_commit(&mut self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        let prefix = match self.path.file_name() {
            Some(name) => format!("{}.", name.to_string_lossy()),
            None => "archive.".to_string(),
        };

        let mut builder = Builder::new();
        builder.prefix(&prefix).suffix(&self.config.temp_suffix);
        if !self.exists {
            default_permissions(&mut builder);
        }
        let mut scratch = builder.tempfile_in(&dir)?;

        let committed = {
            let mut out = BufWriter::with_capacity(self.config.buffer_size, &mut scratch);
            let committed = write_archive(
                &mut self.index,
                &mut self.handle,
                &mut out,
                &self.config,
                self.diagnostics.as_ref(),
            )?;
            out.flush()?;
            committed
        };
        if self.exists {
            let permissions = fs::metadata(&self.path)?.permissions();
            scratch.as_file().set_permissions(permissions)?;
        }
        scratch.as_file().sync_all()?;

        // The old handle has to go before the rename on some platforms
        self.handle = None;
        if let Err(PersistError { error, file }) = scratch.persist(&self.path) {
            let temp_path = file.path().to_path_buf();
            if let Err(keep_err) = file.keep() {
                self.diagnostics.error(&format!(
                    "could not keep scratch file {}: {}",
                    temp_path.display(),
                    keep_err.error
                ));
            }
            if self.exists {
                self.handle = File::open(&self.path)
                    .ok()
                    .map(|f| BufReader::with_capacity(self.config.buffer_size, f));
            }
            return Err(ZipError::CommitFailed { temp_path, source: error });
        }

        let count = committed.len();
        self.index.replace_all(committed);
        self.exists = true;
        self.altered = false;

        let file = File::open(&self.path)?;
        self.handle = Some(BufReader::with_capacity(self.config.buffer_size, file));

        self.diagnostics
            .info(&format!("saved {} ({} entries)", self.path.display(), count));
        Ok(())
    }
}

/// Write a complete archive for `index` into `out`
///
/// Persisted entries are copied from `source` byte for byte, pending entries
/// are encoded from their sources. Returns the entries as they now exist in
/// `out`; `index` itself is not modified.
pub(crate) fn write_archive<W: Write + Seek>(
    index: &mut DirectoryIndex,
    source: &mut Option<BufReader<File>>,
    out: &mut W,
    config: &ArchiveConfig,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<Entry>> {
    let (existing, pending) = index.partition_mut();
    let mut committed = Vec::with_capacity(existing.len() + pending.len());
    let mut position = out.stream_position()?;

    for entry in existing {
        let copied = copy_entry(entry, source, out, &mut position, config).map_err(|err| {
            diagnostics.error(&format!("failed to copy {}: {}", entry.name, err));
            err
        })?;
        committed.push(copied);
    }

    for entry in pending {
        let written = write_new_entry(entry, out, &mut position, config).map_err(|err| {
            diagnostics.error(&format!("failed to write {}: {}", entry.name, err));
            err
        })?;
        committed.push(written);
    }

    let cd_offset = to_u32(position, "central directory offset")?;
    let mut cd_size = 0u64;
    for entry in &committed {
        cd_size += entry.central_header.write_to(
            &mut *out,
            entry.name.as_bytes(),
            &entry.extra,
            &entry.comment,
        )? as u64;
    }

    EndOfCentralDirectory::new(
        committed.len() as u16,
        to_u32(cd_size, "central directory size")?,
        cd_offset,
    )
    .write_to(&mut *out)?;

    tracing::debug!(
        target: LOG_TARGET,
        entries = committed.len(),
        cd_offset,
        cd_size,
        "central directory written"
    );
    Ok(committed)
}

// Copy a persisted entry verbatim: local header, name, extra field, payload.
// The header cached by the last save is trusted; otherwise it is re-read.
fn copy_entry<W: Write + Seek>(
    entry: &Entry,
    source: &mut Option<BufReader<File>>,
    out: &mut W,
    position: &mut u64,
    config: &ArchiveConfig,
) -> Result<Entry> {
    let src = source
        .as_mut()
        .ok_or_else(|| ZipError::HandleInvalid(format!("no source for {}", entry.name)))?;

    let local = match entry.local_header {
        Some(cached) => {
            src.seek(SeekFrom::Start(entry.local_header_offset + LOCAL_HEADER_SIZE as u64))?;
            cached
        }
        None => LocalFileHeader::read_at(src, entry.local_header_offset)?,
    };
    let (name, extra) = local.read_fields(&mut *src)?;

    let offset = *position;
    let header_len = local.write_with_fields(&mut *out, &name, &extra)?;
    copy_raw(src, out, local.compressed_size as u64, config.buffer_size)?;
    *position += header_len as u64 + local.compressed_size as u64;

    let mut central = entry.central_header;
    central.local_header_offset = to_u32(offset, "local header offset")?;

    Ok(Entry::committed(
        entry.name.clone(),
        entry.method,
        local,
        central,
        entry.extra.clone(),
        entry.comment.clone(),
        offset,
    ))
}

// Encode a pending entry behind a reserved header, then fill the header in
fn write_new_entry<W: Write + Seek>(
    entry: &mut Entry,
    out: &mut W,
    position: &mut u64,
    config: &ArchiveConfig,
) -> Result<Entry> {
    let name_len = entry.name.len();
    if name_len > u16::MAX as usize {
        return Err(ZipError::NameTooLong(name_len));
    }

    let modified;
    let mut reader: Box<dyn Read + '_> = match entry.source.as_mut() {
        Some(EntrySource::Path(path)) => {
            if !path.exists() {
                return Err(ZipError::SourceMissing(path.clone()));
            }
            let file = File::open(&*path)?;
            modified = file
                .metadata()
                .and_then(|meta| meta.modified())
                .map(DosDateTime::from_system_time)
                .unwrap_or_default();
            Box::new(BufReader::with_capacity(config.buffer_size, file))
        }
        Some(EntrySource::Stream(stream)) => {
            stream.seek(SeekFrom::Start(0))?;
            modified = DosDateTime::default();
            Box::new(&mut **stream)
        }
        None => return Err(ZipError::SourceMissing(entry.name.clone().into())),
    };

    let header_offset = *position;
    let reserved = (LOCAL_HEADER_SIZE + name_len) as u64;
    out.seek(SeekFrom::Start(header_offset + reserved))?;

    let summary = compress_entry(
        entry.method,
        &mut reader,
        out,
        config.compression_level,
        config.buffer_size,
    )?;

    let local = LocalFileHeader::new(
        entry.method,
        modified,
        summary.crc32,
        to_u32(summary.compressed_size, "compressed size")?,
        to_u32(summary.uncompressed_size, "uncompressed size")?,
        name_len as u16,
    );
    let offset32 = to_u32(header_offset, "local header offset")?;

    out.seek(SeekFrom::Start(header_offset))?;
    local.write_with_fields(&mut *out, entry.name.as_bytes(), &[])?;
    *position = header_offset + reserved + summary.compressed_size;
    out.seek(SeekFrom::Start(*position))?;

    Ok(Entry::committed(
        entry.name.clone(),
        entry.method,
        local,
        CentralFileHeader::from_local(&local, offset32),
        Vec::new(),
        Vec::new(),
        header_offset,
    ))
}
