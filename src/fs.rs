//! Narrow filesystem interface used by the compiler and the cache gate.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::error::Result;

/// The handful of filesystem operations the core needs. Kept as a trait so
/// tests can observe cache writes and fake modification times.
pub trait Files {
    /// Reads a file to a string.
    fn get(&self, path: &Path) -> Result<String>;

    /// Writes a file, atomically from the caller's perspective.
    fn put(&self, path: &Path, contents: &str) -> Result<()>;

    /// Whether the file exists.
    fn exists(&self, path: &Path) -> bool;

    /// Last modification time of the file.
    fn last_modified(&self, path: &Path) -> Result<SystemTime>;
}

/// [`Files`] backed by `std::fs`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a partially written artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFiles;

impl Files for StdFiles {
    fn get(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn put(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn last_modified(&self, path: &Path) -> Result<SystemTime> {
        Ok(fs::metadata(path)?.modified()?)
    }
}
