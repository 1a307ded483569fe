//! Utility functions for secure path handling and common operations

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::constants as C;

/// Resolve a relative path against a base directory, ensuring the result
/// stays within the base. Returns an error if the path attempts to escape,
/// which guards archive extraction against zip-slip entries.
pub fn secure_path(base: &Path, relative: &str) -> io::Result<PathBuf> {
    // Reject absolute inputs (Unix roots and Windows drive letters) before
    // splitting into components
    if relative.starts_with('/')
        || relative.starts_with('\\')
        || (relative.len() >= 2 && relative.as_bytes()[1] == b':')
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Absolute paths are not allowed",
        ));
    }

    let mut result = base.to_path_buf();

    for component in relative.split(|c| c == '/' || c == '\\') {
        match component {
            "" => continue,
            "." => continue,
            ".." => {
                if !result.starts_with(base) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "Path traversal detected: cannot escape session directory",
                    ));
                }
                result.pop();
            }
            _ => {
                // Drive letters may also appear as embedded components
                if component.len() >= 2 && component.as_bytes()[1] == b':' {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "Absolute paths are not allowed",
                    ));
                }
                result.push(component);
            }
        }
    }

    // Final check: ensure the resolved path is within the base.
    // Use dunce::canonicalize when possible to avoid UNC prefixes on Windows.
    if base.exists() {
        let canonical_base = dunce::canonicalize(base).unwrap_or_else(|_| base.to_path_buf());
        if result.exists() {
            let canonical_result = dunce::canonicalize(&result).unwrap_or_else(|_| result.clone());
            if !canonical_result.starts_with(&canonical_base) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "Path traversal detected: resolved path escapes session directory",
                ));
            }
        } else if !result.starts_with(base) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Path traversal detected: resolved path escapes session directory",
            ));
        }
    } else if !result.starts_with(base) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Path traversal detected: resolved path escapes session directory",
        ));
    }

    Ok(result)
}

/// Hash a string using SHA256
pub fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let hash = hasher.finalize();
    format!("{:x}", hash)
}

/// Abbreviate hash to git-style length (12 characters for SHA256)
pub fn abbreviate_hash(full_hash: &str) -> String {
    full_hash.chars().take(C::HASH_ABBREVIATION_LENGTH).collect()
}

/// Filename for the materialized inline resource backing a block.
/// Derived from the block id so repeated materialization of the same
/// block overwrites the same file instead of accumulating copies.
pub fn inline_file_name(block_id: &str) -> String {
    format!(
        "{}{}{}",
        C::INLINE_FILE_PREFIX,
        abbreviate_hash(&hash_source(block_id)),
        C::MARKDOWN_EXTENSION
    )
}

/// Pick a filename not present in `used`, appending a numeric suffix before
/// the extension when necessary: notes.txt, notes_1.txt, notes_2.txt, ...
pub fn unique_file_name(name: &str, used: &[String]) -> String {
    if !used.iter().any(|n| n == name) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, ext);
        if !used.iter().any(|n| n == &candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Extract a display title from file content (first H1 heading) falling
/// back to the file stem.
pub fn title_from_content(path: &Path, content: &str) -> String {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("# ") {
            return trimmed.trim_start_matches("# ").to_string();
        }
    }

    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Lowercased file extension without the dot, if any
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// True for resource paths that point at remote content rather than a file
pub fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Display a path with forward slashes (cross-platform standard)
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
