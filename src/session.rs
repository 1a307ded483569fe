use std::path::{Path, PathBuf};

use crate::constants as C;

/// A Session owns one isolated storage subtree: concurrent users never
/// share or race on the same outline, blocks, or files.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier of the session
    pub id: String,
    /// Path to the session directory
    pub path: PathBuf,
}

impl Session {
    /// Create a new Session handle for the given id under a base path
    pub fn new(id: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        let id = id.into();
        let path = base_path.into().join(&id);
        Self { id, path }
    }

    /// Directory holding the session's resource files
    pub fn files_dir(&self) -> PathBuf {
        self.path.join(C::FILES_SUBDIR)
    }

    /// Directory for the session's scratch files
    pub fn temp_dir(&self) -> PathBuf {
        self.path.join(C::TEMP_SUBDIR)
    }

    /// Check if this session exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the session directory tree
    pub fn create(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.files_dir())?;
        std::fs::create_dir_all(self.temp_dir())
    }

    /// List all session ids under the given base directory
    pub fn list_all(base_path: impl AsRef<Path>) -> std::io::Result<Vec<String>> {
        let mut sessions = Vec::new();
        if base_path.as_ref().exists() {
            for entry in std::fs::read_dir(base_path)? {
                let entry = entry?;
                if entry.path().is_dir() {
                    if let Some(id) = entry.file_name().to_str() {
                        sessions.push(id.to_string());
                    }
                }
            }
        }
        sessions.sort();
        Ok(sessions)
    }
}
