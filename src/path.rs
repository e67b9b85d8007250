//! Entry name helpers
//!
//! Stored names always use forward slashes. Directory prefixes passed to
//! `add_file` are canonicalized by [`normalize_directory`] before the base
//! name of the source is appended.

use crate::error::{Result, ZipError};
use std::path::{Component, Path, PathBuf};

/// Canonicalize an archive-internal directory
///
/// Backslashes become slashes, a leading `X:` drive prefix is dropped together
/// with one following slash, remaining leading slashes are stripped and the
/// result is lower-cased. A non-empty result ends with exactly one slash.
pub fn normalize_directory(directory: &str) -> String {
    let converted = directory.replace('\\', "/");

    let mut rest = converted.as_str();
    let bytes = rest.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        rest = &rest[2..];
        rest = rest.strip_prefix('/').unwrap_or(rest);
    }

    let trimmed = rest.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    let mut normalized = trimmed.to_lowercase();
    normalized.push('/');
    normalized
}

/// Final component of a `/` or `\` separated name
pub fn base_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name)
}

/// Compose the stored entry name for a source added below `internal_dir`
pub fn entry_name(internal_dir: &str, source_name: &str) -> Result<String> {
    let base = base_name(source_name);
    if base.is_empty() || base == "." || base == ".." {
        return Err(ZipError::InvalidName(source_name.to_string()));
    }

    let mut name = normalize_directory(internal_dir);
    name.push_str(base);
    if name.split('/').any(|segment| segment == "..") {
        return Err(ZipError::PathTraversal(name));
    }
    if name.len() > u16::MAX as usize {
        return Err(ZipError::NameTooLong(name.len()));
    }
    Ok(name)
}

// Colons are ordinary file name characters outside Windows
#[cfg(windows)]
fn has_drive_or_stream(name: &str) -> bool {
    name.contains(':')
}

#[cfg(not(windows))]
fn has_drive_or_stream(_name: &str) -> bool {
    false
}

/// Resolve where an entry is written when extracted
///
/// Names that are absolute or step outside the destination are refused.
pub fn output_path(
    entry_name: &str,
    dest_dir: Option<&Path>,
    keep_dir_structure: bool,
) -> Result<PathBuf> {
    let relative = if keep_dir_structure {
        entry_name
    } else {
        base_name(entry_name)
    };

    if relative.is_empty() {
        return Err(ZipError::InvalidName(entry_name.to_string()));
    }

    let relative_path = Path::new(relative);
    for component in relative_path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ZipError::PathTraversal(entry_name.to_string()));
            }
        }
    }
    if relative.starts_with('/') || relative.starts_with('\\') || has_drive_or_stream(relative) {
        return Err(ZipError::PathTraversal(entry_name.to_string()));
    }

    Ok(match dest_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(relative_path),
        _ => relative_path.to_path_buf(),
    })
}
