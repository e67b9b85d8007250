//! Crash Recovery Tests
//!
//! A save either replaces the archive completely or leaves it untouched.
//! Covers failed saves, unsaved changes, truncated files and commit failures.

mod common;

use common::{build_zip, open_recorded, text_of_len, write_file, RawEntry};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tempfile::TempDir;
use ziparchive_rs::{ExtractOptions, ExtractTarget, Level, ZipArchive, ZipError};

/// Helper: Create a saved archive with ten small entries
fn create_complete_archive(dir: &Path) -> std::path::PathBuf {
    let archive_path = dir.join("complete.zip");
    let mut archive = ZipArchive::open(&archive_path).unwrap();
    for i in 0..10 {
        let source = write_file(dir, &format!("src/file{}.txt", i), format!("data{}", i).as_bytes());
        archive.add_file(&source, "", false).unwrap();
    }
    archive.save().unwrap();
    archive_path
}

/// Helper: Names of everything in `dir` except the given file names
fn stray_files(dir: &Path, expected: &[&str]) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| !expected.contains(&name.as_str()))
        .collect()
}

#[test]
fn test_drop_without_save_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("never.zip");
    let source = write_file(dir.path(), "a.txt", b"alpha");

    {
        let mut archive = ZipArchive::open(&archive_path).unwrap();
        archive.add_file(&source, "", false).unwrap();
        // Dropped without save
    }

    assert!(!archive_path.exists());
    assert!(stray_files(dir.path(), &["a.txt"]).is_empty());

    println!("✓ Unsaved archive leaves no file behind");
}

#[test]
fn test_unsaved_changes_are_discarded() {
    let dir = TempDir::new().unwrap();
    let archive_path = create_complete_archive(dir.path());
    let before = fs::read(&archive_path).unwrap();

    {
        let mut archive = ZipArchive::open(&archive_path).unwrap();
        assert!(archive.remove_file("file0.txt"));
        let extra = write_file(dir.path(), "extra.txt", b"never saved");
        archive.add_file(&extra, "", false).unwrap();
    }

    assert_eq!(fs::read(&archive_path).unwrap(), before);
    let archive = ZipArchive::open(&archive_path).unwrap();
    assert_eq!(archive.num_files(), 10);
    assert!(archive.contains_file("file0.txt"));
    assert!(!archive.contains_file("extra.txt"));
}

#[test]
fn test_failed_save_leaves_archive_untouched() {
    let dir = TempDir::new().unwrap();
    let archive_path = create_complete_archive(dir.path());
    let before = fs::read(&archive_path).unwrap();

    let (mut archive, recorder) = open_recorded(&archive_path);
    let good = write_file(dir.path(), "good.txt", b"good");
    archive.add_file(&good, "", false).unwrap();
    archive
        .add_file(dir.path().join("vanished.txt"), "", false)
        .unwrap();
    assert!(archive.remove_file("file3.txt"));

    let result = archive.save();
    assert!(matches!(result, Err(ZipError::SourceMissing(_))));
    assert!(recorder.contains(Level::Error, "vanished.txt"));

    // File on disk is byte-identical, no scratch files remain
    assert_eq!(fs::read(&archive_path).unwrap(), before);
    assert!(stray_files(dir.path(), &["complete.zip", "src", "good.txt"]).is_empty());

    // In-memory state still holds the pending changes
    assert!(archive.is_altered());
    assert!(archive.contains_file("vanished.txt"));
    assert!(!archive.contains_file("file3.txt"));

    // Saved entries are still readable through the old handle
    let data = archive
        .extract_file("file1.txt", ExtractTarget::Memory, &ExtractOptions::default())
        .unwrap();
    assert_eq!(data.contents().unwrap(), b"data1");

    // Fixing the problem lets the next save go through
    assert!(archive.remove_file("vanished.txt"));
    archive.save().unwrap();
    let reopened = ZipArchive::open(&archive_path).unwrap();
    assert_eq!(reopened.num_files(), 10);
    assert!(reopened.contains_file("good.txt"));
    assert!(!reopened.contains_file("file3.txt"));

    println!("✓ Failed save rolled back cleanly");
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("no_such_dir").join("a.zip");
    let source = write_file(dir.path(), "a.txt", b"alpha");

    let (mut archive, _) = open_recorded(&archive_path);
    archive.add_file(&source, "", false).unwrap();

    assert!(matches!(archive.save(), Err(ZipError::Io(_))));
    assert!(!archive_path.exists());
    assert!(archive.is_altered());
}

#[cfg(unix)]
#[test]
fn test_commit_failure_keeps_scratch_file() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("blocked.zip");
    let source = write_file(dir.path(), "payload.txt", &text_of_len(2048));

    let (mut archive, recorder) = open_recorded(&archive_path);
    archive.add_file(&source, "data", false).unwrap();

    // A non-empty directory at the archive path cannot be renamed over
    write_file(&archive_path, "occupant.txt", b"in the way");

    let temp_path = match archive.save() {
        Err(ZipError::CommitFailed { temp_path, .. }) => temp_path,
        other => panic!("Expected CommitFailed, got: {:?}", other),
    };
    assert!(recorder.contains(Level::Error, "save"));
    assert!(archive.is_altered());

    // The assembled archive survives for manual recovery
    assert!(temp_path.exists());
    assert!(temp_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("blocked.zip."));

    let mut recovered = ZipArchive::open(&temp_path).unwrap();
    let data = recovered
        .extract_file("data/payload.txt", ExtractTarget::Memory, &ExtractOptions::default())
        .unwrap();
    assert_eq!(data.contents().unwrap(), text_of_len(2048));

    println!("✓ Commit failure kept {}", temp_path.display());
}

#[test]
fn test_truncated_archives_rejected() {
    let dir = TempDir::new().unwrap();
    let archive_path = create_complete_archive(dir.path());
    let full_len = fs::metadata(&archive_path).unwrap().len();

    for percent in [10u64, 50, 90, 99] {
        let copy = dir.path().join(format!("truncated_{}.zip", percent));
        fs::copy(&archive_path, &copy).unwrap();
        let file = OpenOptions::new().write(true).open(&copy).unwrap();
        file.set_len(full_len * percent / 100).unwrap();
        drop(file);

        assert!(
            ZipArchive::open(&copy).is_err(),
            "Archive truncated to {}% should be rejected",
            percent
        );
    }
}

#[test]
fn test_reopen_after_external_delete_starts_empty() {
    let dir = TempDir::new().unwrap();
    let bytes = build_zip(&[RawEntry::stored("kept.txt", b"kept")], b"");
    let archive_path = write_file(dir.path(), "external.zip", &bytes);

    let (mut archive, _) = open_recorded(&archive_path);
    fs::remove_file(&archive_path).unwrap();

    archive.close();
    archive.reopen().unwrap();
    assert!(!archive.archive_exists());
    assert!(archive.is_empty());
}

#[test]
fn test_close_and_reopen_resyncs_with_disk() {
    let dir = TempDir::new().unwrap();
    let archive_path = create_complete_archive(dir.path());

    let (mut first, _) = open_recorded(&archive_path);
    let (mut second, _) = open_recorded(&archive_path);

    assert!(second.remove_file("file9.txt"));
    second.save().unwrap();

    assert!(first.contains_file("file9.txt"));
    first.close();
    first.reopen().unwrap();
    assert_eq!(first.num_files(), 9);
    assert!(!first.contains_file("file9.txt"));
}
