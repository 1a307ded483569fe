//! Docpack Bundler / Unbundler
//!
//! A docpack is one zip archive holding the serialized outline plus every
//! resource file it references, portable across hosts: internal paths are
//! archive-relative and the manifest's key-to-stored-filename map is the
//! authoritative association, so collision renaming never breaks which
//! section references which content.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;

use crate::constants as C;
use crate::outline::{Outline, OutlineError};
use crate::util;

// === Errors ===

/// Failure modes of docpack I/O
#[derive(Debug)]
pub enum BundleError {
    /// One or more resource files carry an extension outside the allow-list.
    /// Fatal for the whole import; partial imports would leave an
    /// inconsistent reference graph.
    UnsupportedExtensions { files: Vec<String> },
    /// A required archive entry is absent
    MissingEntry { name: String },
    /// The archived outline or manifest could not be parsed
    InvalidContent { message: String },
    Io(io::Error),
    Zip(zip::result::ZipError),
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::UnsupportedExtensions { files } => {
                write!(
                    f,
                    "Import aborted: unsupported resource file types: {}",
                    files.join(", ")
                )
            }
            BundleError::MissingEntry { name } => {
                write!(f, "Archive entry not found: {}", name)
            }
            BundleError::InvalidContent { message } => {
                write!(f, "Invalid archive content: {}", message)
            }
            BundleError::Io(e) => write!(f, "I/O error: {}", e),
            BundleError::Zip(e) => write!(f, "Archive error: {}", e),
        }
    }
}

impl std::error::Error for BundleError {}

impl From<io::Error> for BundleError {
    fn from(e: io::Error) -> Self {
        BundleError::Io(e)
    }
}

impl From<zip::result::ZipError> for BundleError {
    fn from(e: zip::result::ZipError) -> Self {
        BundleError::Zip(e)
    }
}

impl From<OutlineError> for BundleError {
    fn from(e: OutlineError) -> Self {
        BundleError::InvalidContent {
            message: e.to_string(),
        }
    }
}

pub type BundleResult<T> = Result<T, BundleError>;

// === Manifest ===

/// Per-file entry in the docpack manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleFileEntry {
    pub key: String,
    pub stored_name: String,
    pub original_name: String,
}

/// The key-to-stored-filename map that travels with every docpack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub version: u32,
    pub created_at: String,
    pub files: Vec<BundleFileEntry>,
}

// === Bundling ===

/// Write a docpack archive for the outline at `destination`. File-backed
/// resources are copied into the archive under resources/ with collision
/// renaming; URL resources travel in the outline only. A resource file
/// missing on disk is skipped with a warning, siblings proceed.
pub fn bundle(outline: &Outline, destination: &Path) -> BundleResult<BundleManifest> {
    let file = fs::File::create(destination)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut archived = outline.clone();
    let mut used_names: Vec<String> = Vec::new();
    let mut entries = Vec::new();

    for resource in &mut archived.resources {
        if util::is_url(&resource.path) {
            continue;
        }

        let source = PathBuf::from(&resource.path);
        let data = match fs::read(&source) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    key = %resource.key,
                    path = %resource.path,
                    "resource file unreadable, leaving out of bundle: {}",
                    e
                );
                // The archived outline must not retain the host path either
                resource.path.clear();
                continue;
            }
        };

        let original_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| resource.key.clone());
        let stored_name = util::unique_file_name(&original_name, &used_names);
        used_names.push(stored_name.clone());

        zip.start_file(format!("{}/{}", C::RESOURCE_DIR, stored_name), options)?;
        zip.write_all(&data)?;

        entries.push(BundleFileEntry {
            key: resource.key.clone(),
            stored_name: stored_name.clone(),
            original_name,
        });

        // No absolute host paths inside the archive
        resource.path = format!("{}/{}", C::RESOURCE_DIR, stored_name);
    }

    let manifest = BundleManifest {
        version: C::BUNDLE_VERSION,
        created_at: Local::now().format(C::MANIFEST_TIMESTAMP_FORMAT).to_string(),
        files: entries,
    };

    zip.start_file(C::OUTLINE_ENTRY, options)?;
    zip.write_all(archived.to_json()?.as_bytes())?;

    zip.start_file(C::MANIFEST_ENTRY, options)?;
    let manifest_json = serde_json::to_string_pretty(&manifest).map_err(|e| {
        BundleError::InvalidContent {
            message: e.to_string(),
        }
    })?;
    zip.write_all(manifest_json.as_bytes())?;

    zip.finish()?;
    Ok(manifest)
}

// === Unbundling ===

/// Extract a docpack into `target_dir` and return the outline with every
/// file-backed resource path rewritten to its extracted location. The
/// extension allow-list is enforced over the whole archive before anything
/// is extracted: a single offender aborts the import and the full offending
/// list is reported.
pub fn unbundle(
    archive: &Path,
    target_dir: &Path,
    allowed_extensions: &[&str],
) -> BundleResult<Outline> {
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let manifest: BundleManifest = serde_json::from_str(&read_entry(&mut zip, C::MANIFEST_ENTRY)?)
        .map_err(|e| BundleError::InvalidContent {
            message: e.to_string(),
        })?;

    // All-or-nothing gate, checked before any file lands on disk
    let offenders: Vec<String> = manifest
        .files
        .iter()
        .filter(|entry| {
            !util::file_extension(&entry.stored_name)
                .map(|ext| allowed_extensions.contains(&ext.as_str()))
                .unwrap_or(false)
        })
        .map(|entry| entry.original_name.clone())
        .collect();
    if !offenders.is_empty() {
        return Err(BundleError::UnsupportedExtensions { files: offenders });
    }

    let mut outline = Outline::from_json(&read_entry(&mut zip, C::OUTLINE_ENTRY)?)?;

    fs::create_dir_all(target_dir)?;
    for entry in &manifest.files {
        let archive_name = format!("{}/{}", C::RESOURCE_DIR, entry.stored_name);
        let mut data = Vec::new();
        match zip.by_name(&archive_name) {
            Ok(mut stored) => {
                stored.read_to_end(&mut data)?;
            }
            Err(zip::result::ZipError::FileNotFound) => {
                tracing::warn!(
                    key = %entry.key,
                    name = %archive_name,
                    "manifest references a file the archive does not contain"
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        // secure_path guards against zip-slip style stored names
        let destination = util::secure_path(target_dir, &entry.stored_name)?;
        fs::write(&destination, &data)?;

        if let Some(resource) = outline.resources.iter_mut().find(|r| r.key == entry.key) {
            resource.path = util::display_path(&destination);
        }
    }

    Ok(outline)
}

fn read_entry(zip: &mut zip::ZipArchive<fs::File>, name: &str) -> BundleResult<String> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(BundleError::MissingEntry {
                name: name.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}
