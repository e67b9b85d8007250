use crate::archive::entry::{Entry, EntryInfo, EntrySource};
use crate::archive::format::CompressionMethod;
use crate::archive::index::DirectoryIndex;
use crate::config::ArchiveConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Result, ZipError};
use crate::path::entry_name;
use crate::stream::ByteStream;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A ZIP archive on disk, open for reading and incremental modification
///
/// Additions and removals only touch the in-memory directory index until
/// [`save`](ZipArchive::save) rewrites the archive file. If the file does not
/// exist yet, the archive starts empty and `save` creates it.
pub struct ZipArchive {
    pub(crate) path: PathBuf,
    pub(crate) config: ArchiveConfig,
    pub(crate) diagnostics: Box<dyn Diagnostics>,
    pub(crate) handle: Option<BufReader<File>>,
    pub(crate) index: DirectoryIndex,
    pub(crate) is_open: bool,
    pub(crate) exists: bool,
    pub(crate) altered: bool,
}

impl ZipArchive {
    /// Open an archive with default settings, logging through `tracing`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ArchiveConfig::default(), Box::new(TracingDiagnostics))
    }

    /// Open an archive with explicit settings and diagnostics sink
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        config: ArchiveConfig,
        diagnostics: Box<dyn Diagnostics>,
    ) -> Result<Self> {
        config.validate()?;

        let mut archive = Self {
            path: path.as_ref().to_path_buf(),
            config,
            diagnostics,
            handle: None,
            index: DirectoryIndex::new(),
            is_open: false,
            exists: false,
            altered: false,
        };
        archive.load()?;
        Ok(archive)
    }

    /// Drop the file handle and forget all entries, including unsaved ones
    pub fn close(&mut self) {
        self.handle = None;
        self.index.clear();
        self.is_open = false;
        self.altered = false;
    }

    /// Open a closed archive again from its path
    pub fn reopen(&mut self) -> Result<()> {
        if self.is_open {
            self.diagnostics
                .error(&format!("{}: archive is already open", self.path.display()));
            return Err(ZipError::AlreadyOpen);
        }
        self.load()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// True once the archive file is present on disk
    pub fn archive_exists(&self) -> bool {
        self.exists
    }

    /// True if the index has changes not yet saved
    pub fn is_altered(&self) -> bool {
        self.altered
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Queue a file from disk, stored under `internal_dir`
    ///
    /// The source is only read when the archive is saved. Returns `Ok(false)`
    /// if an entry with the same name exists and `replace` is not set.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, internal_dir: &str, replace: bool) -> Result<bool> {
        let method = self.config.default_compression;
        self.add_file_with_compression(path, internal_dir, replace, method)
    }

    pub fn add_file_with_compression<P: AsRef<Path>>(
        &mut self,
        path: P,
        internal_dir: &str,
        replace: bool,
        method: CompressionMethod,
    ) -> Result<bool> {
        self.ensure_open("add file")?;

        let path = path.as_ref();
        let name = entry_name(internal_dir, &path.to_string_lossy())?;
        let entry = Entry::pending(name, EntrySource::Path(path.to_path_buf()), method);
        Ok(self.insert(entry, replace))
    }

    /// Queue an open stream; its payload is read from the start at save time
    pub fn add_stream<S: ByteStream + 'static>(&mut self, stream: S, internal_dir: &str, replace: bool) -> Result<bool> {
        let method = self.config.default_compression;
        self.add_stream_with_compression(stream, internal_dir, replace, method)
    }

    pub fn add_stream_with_compression<S: ByteStream + 'static>(
        &mut self,
        stream: S,
        internal_dir: &str,
        replace: bool,
        method: CompressionMethod,
    ) -> Result<bool> {
        self.ensure_open("add stream")?;

        let name = entry_name(internal_dir, stream.name())?;
        let entry = Entry::pending(name, EntrySource::Stream(Box::new(stream)), method);
        Ok(self.insert(entry, replace))
    }

    /// Remove an entry, saved or not. Returns false if there was none.
    pub fn remove_file(&mut self, name: &str) -> bool {
        if self.ensure_open("remove file").is_err() {
            return false;
        }
        match self.index.remove(name) {
            Some(_) => {
                self.altered = true;
                true
            }
            None => {
                self.diagnostics
                    .warn(&format!("cannot remove {}: not in archive {}", name, self.path.display()));
                false
            }
        }
    }

    pub fn contains_file(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Names of all entries, including unsaved ones, in sorted order
    pub fn file_names(&self) -> Vec<String> {
        self.index.names()
    }

    pub fn num_files(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn entry_info(&self, name: &str) -> Option<EntryInfo> {
        self.index.get(name).map(Entry::info)
    }

    fn insert(&mut self, entry: Entry, replace: bool) -> bool {
        let name = entry.name.clone();
        if self.index.insert_or_replace(entry, replace) {
            self.altered = true;
            true
        } else {
            self.diagnostics.warn(&format!(
                "{} already exists in archive {}",
                name,
                self.path.display()
            ));
            false
        }
    }

    /// Single check used by every operation that needs a usable archive
    pub(crate) fn ensure_open(&self, operation: &str) -> Result<()> {
        if !self.is_open {
            self.diagnostics.error(&format!(
                "{}: archive {} is not open",
                operation,
                self.path.display()
            ));
            return Err(ZipError::NotOpen);
        }
        if self.exists && self.handle.is_none() {
            let reason = format!("no file handle for {}", self.path.display());
            self.diagnostics.error(&format!("{}: {}", operation, reason));
            return Err(ZipError::HandleInvalid(reason));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .field("is_open", &self.is_open)
            .field("exists", &self.exists)
            .field("altered", &self.altered)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::stream::MemoryFile;
    use tempfile::TempDir;

    fn new_archive(dir: &TempDir) -> (ZipArchive, RecordingDiagnostics) {
        let recorder = RecordingDiagnostics::new();
        let archive = ZipArchive::open_with(
            dir.path().join("new.zip"),
            ArchiveConfig::default(),
            Box::new(recorder.clone()),
        )
        .unwrap();
        (archive, recorder)
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let (archive, _) = new_archive(&dir);

        assert!(archive.is_open());
        assert!(!archive.archive_exists());
        assert!(!archive.is_altered());
        assert_eq!(archive.num_files(), 0);
    }

    #[test]
    fn test_add_does_not_touch_filesystem() {
        let dir = TempDir::new().unwrap();
        let (mut archive, _) = new_archive(&dir);

        assert!(archive.add_file("/nowhere/x.dat", "Foo\\Bar\\", false).unwrap());
        assert!(archive.contains_file("foo/bar/x.dat"));
        assert!(archive.is_altered());
        assert!(archive.entry_info("foo/bar/x.dat").unwrap().is_new);
    }

    #[test]
    fn test_duplicate_add_is_reported() {
        let dir = TempDir::new().unwrap();
        let (mut archive, recorder) = new_archive(&dir);

        assert!(archive.add_file("a/x.dat", "", false).unwrap());
        assert!(!archive.add_file("b/x.dat", "", false).unwrap());
        assert!(recorder.warnings().iter().any(|m| m.contains("x.dat already exists")));
        assert!(archive.add_file("b/x.dat", "", true).unwrap());
        assert_eq!(archive.num_files(), 1);
    }

    #[test]
    fn test_add_stream_uses_stream_name() {
        let dir = TempDir::new().unwrap();
        let (mut archive, _) = new_archive(&dir);

        let stream = MemoryFile::from_bytes("scratch/report.csv", b"a,b\n1,2\n".to_vec());
        assert!(archive.add_stream(stream, "Exports", false).unwrap());
        assert_eq!(archive.file_names(), vec!["exports/report.csv".to_string()]);
    }

    #[test]
    fn test_remove_file() {
        let dir = TempDir::new().unwrap();
        let (mut archive, recorder) = new_archive(&dir);

        archive.add_file("x.dat", "", false).unwrap();
        assert!(archive.remove_file("x.dat"));
        assert!(!archive.remove_file("x.dat"));
        assert_eq!(recorder.warnings().len(), 1);
    }

    #[test]
    fn test_operations_on_closed_archive() {
        let dir = TempDir::new().unwrap();
        let (mut archive, recorder) = new_archive(&dir);

        archive.add_file("x.dat", "", false).unwrap();
        archive.close();
        assert!(!archive.is_open());
        assert_eq!(archive.num_files(), 0);

        assert!(matches!(archive.add_file("y.dat", "", false), Err(ZipError::NotOpen)));
        assert!(!archive.remove_file("y.dat"));
        assert!(recorder.contains(crate::diagnostics::Level::Error, "not open"));

        archive.reopen().unwrap();
        assert!(matches!(archive.reopen(), Err(ZipError::AlreadyOpen)));
    }

    #[test]
    fn test_archive_with_pending_streams_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let dir = TempDir::new().unwrap();
        let (mut archive, _) = new_archive(&dir);
        archive
            .add_stream(MemoryFile::from_bytes("a.txt", b"a".to_vec()), "", false)
            .unwrap();
        assert_send(&archive);

        let handle = std::thread::spawn(move || archive.num_files());
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ArchiveConfig {
            buffer_size: 0,
            ..ArchiveConfig::default()
        };
        let result = ZipArchive::open_with(dir.path().join("a.zip"), config, Box::new(TracingDiagnostics));
        assert!(matches!(result, Err(ZipError::Config(_))));
    }
}
