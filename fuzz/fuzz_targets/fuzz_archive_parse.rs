#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tempfile::NamedTempFile;
use ziparchive_rs::{
    ArchiveConfig, ExtractOptions, ExtractTarget, RecordingDiagnostics, ZipArchive,
};

fuzz_target!(|data: &[u8]| {
    // Anything shorter cannot hold an end of central directory record
    if data.len() < 22 {
        return;
    }

    let mut temp_file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };
    if temp_file.write_all(data).is_err() || temp_file.flush().is_err() {
        return;
    }

    // Opening parses the central directory - should never panic
    let mut archive = match ZipArchive::open_with(
        temp_file.path(),
        ArchiveConfig::default(),
        Box::new(RecordingDiagnostics::new()),
    ) {
        Ok(a) => a,
        Err(_) => return,
    };

    // Decoding every entry - should never panic
    for name in archive.file_names() {
        let _ = archive.extract_file(&name, ExtractTarget::Memory, &ExtractOptions::default());
        let _ = archive.entry_info(&name);
    }

    let _ = archive.contains_file("");
    let _ = archive.contains_file("../../../etc/passwd");
});
