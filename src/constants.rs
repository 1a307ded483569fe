//! Constants for docpack
//!
//! This module contains all magic numbers, format strings, and hardcoded values
//! used throughout the codebase to improve maintainability and avoid duplication.

// === Structure Limits ===

/// Maximum indent level a block may reach (bounds recursion and rendering cost)
pub const MAX_INDENT_LEVEL: usize = 5;

// === Resource Keys ===

/// Key prefix for ordinary registry resources: resource_1..resource_N
pub const RESOURCE_KEY_PREFIX: &str = "resource_";

/// Key prefix for materialized inline resources: inline_resource_1..
pub const INLINE_KEY_PREFIX: &str = "inline_resource_";

/// Filename prefix for materialized inline resource files
pub const INLINE_FILE_PREFIX: &str = "inline_";

/// File extension used for materialized inline resources
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Default title given to materialized inline resources without a heading
pub const DEFAULT_INLINE_TITLE: &str = "Edited text";

// === Session Directories ===

/// Subdirectory for a session's resource files
pub const FILES_SUBDIR: &str = "files";

/// Subdirectory for a session's scratch files
pub const TEMP_SUBDIR: &str = "tmp";

// === Docpack Archive ===

/// Archive entry holding the serialized outline
pub const OUTLINE_ENTRY: &str = "outline.json";

/// Archive entry holding the key-to-stored-filename manifest
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Archive subdirectory holding bundled resource files
pub const RESOURCE_DIR: &str = "resources";

/// Docpack manifest format version
pub const BUNDLE_VERSION: u32 = 1;

/// Timestamp format for the manifest created_at field
pub const MANIFEST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File extensions accepted when importing a docpack archive
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "text", "json", "csv", "html", "htm", "pdf", "docx",
];

// === Hash and ID Constants ===

/// Length of abbreviated hash used in inline resource filenames
pub const HASH_ABBREVIATION_LENGTH: usize = 12;
