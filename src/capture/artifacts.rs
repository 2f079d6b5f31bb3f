//! On-disk storage of captured response bodies.

use std::path::{Path, PathBuf};

/// Writes one pretty-printed JSON file per response id.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for a response id.
    ///
    /// Characters outside `[A-Za-z0-9._-]` become `_`, so ids differing only
    /// in such characters share a file. DevTools request ids are digits and
    /// dots and map to themselves.
    pub fn path_for(&self, request_id: &str) -> PathBuf {
        let safe: String = request_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("response_{}.json", safe))
    }

    /// Write the body, creating the directory on demand. Rewriting an id
    /// overwrites its file.
    pub fn write(&self, request_id: &str, body: &serde_json::Value) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(request_id);
        let json = serde_json::to_string_pretty(body)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}
