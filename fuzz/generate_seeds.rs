//! Generate seed corpus for fuzzing

use std::fs;
use std::path::Path;
use ziparchive_rs::{CompressionMethod, MemoryFile, ZipArchive};

fn seed(corpus_dir: &Path, name: &str, files: &[(&str, Vec<u8>, CompressionMethod)]) -> Result<(), Box<dyn std::error::Error>> {
    let path = corpus_dir.join(name);
    if path.exists() {
        fs::remove_file(&path)?;
    }

    let mut archive = ZipArchive::open(&path)?;
    for (file_name, data, method) in files {
        let stream = MemoryFile::from_bytes(*file_name, data.clone());
        archive.add_stream_with_compression(stream, "", true, *method)?;
    }
    archive.save()?;
    println!("✓ Generated: {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = Path::new("fuzz/corpus/fuzz_archive_parse");
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    seed(
        corpus_dir,
        "seed_single_stored.zip",
        &[("test.txt", b"Hello, World!".to_vec(), CompressionMethod::Stored)],
    )?;

    seed(
        corpus_dir,
        "seed_single_deflate.zip",
        &[("test.txt", b"Hello, World!".to_vec(), CompressionMethod::Deflate)],
    )?;

    seed(
        corpus_dir,
        "seed_multi.zip",
        &[
            ("file1.txt", b"First file".to_vec(), CompressionMethod::Stored),
            ("file2.txt", b"Second file".to_vec(), CompressionMethod::Deflate),
            ("file3.txt", b"Third file".to_vec(), CompressionMethod::Deflate),
        ],
    )?;

    seed(
        corpus_dir,
        "seed_large.zip",
        &[(
            "large.txt",
            b"This is test data for compression. ".repeat(1000),
            CompressionMethod::Deflate,
        )],
    )?;

    let binary: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    seed(
        corpus_dir,
        "seed_binary.zip",
        &[("binary.bin", binary, CompressionMethod::Stored)],
    )?;

    // Raw end record only, no entries
    let mut end_record = vec![0x50, 0x4b, 0x05, 0x06];
    end_record.extend_from_slice(&[0u8; 18]);
    fs::write(corpus_dir.join("seed_end_record_only.zip"), end_record)?;

    println!("\n✓ Seed corpus generated in {}", corpus_dir.display());
    Ok(())
}
