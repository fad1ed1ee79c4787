//! View name resolution.
//!
//! Template names use dotted paths (`admin.users.index`) with an optional
//! namespace prefix (`admin::index`). The finder maps a name to a template
//! file on disk, probing each registered location and extension in order.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Separator between a namespace hint and the view name.
pub const HINT_PATH_DELIMITER: &str = "::";

/// Resolves view names to template paths.
pub trait ViewFinder {
    /// Resolves `name` to a template file path.
    fn find(&self, name: &str) -> Result<PathBuf>;

    /// Whether `name` resolves to an existing template.
    fn exists(&self, name: &str) -> bool {
        self.find(name).is_ok()
    }
}

/// A filesystem-backed [`ViewFinder`].
pub struct FileViewFinder {
    /// Locations searched for un-namespaced views, in priority order.
    paths: Vec<PathBuf>,
    /// Namespace hints: `ns::view` searches these locations instead.
    hints: HashMap<String, Vec<PathBuf>>,
    /// File extensions probed for each candidate, in priority order.
    extensions: Vec<String>,
}

impl FileViewFinder {
    /// Creates a finder over the given view locations with the default
    /// extensions (`.blade.html`, `.html`).
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            hints: HashMap::new(),
            extensions: vec!["blade.html".to_string(), "html".to_string()],
        }
    }

    /// Replaces the probed extensions.
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        self.extensions = extensions.into_iter().collect();
        self
    }

    /// Registers (or extends) a namespace hint.
    pub fn add_namespace(&mut self, namespace: &str, path: impl Into<PathBuf>) {
        self.hints
            .entry(namespace.to_string())
            .or_default()
            .push(path.into());
    }

    /// Prepends a location for un-namespaced views.
    pub fn prepend_location(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(0, path.into());
    }

    fn find_in(&self, paths: &[PathBuf], name: &str) -> Option<PathBuf> {
        let relative = name.replace('.', "/");
        for path in paths {
            for ext in &self.extensions {
                let candidate = path.join(format!("{relative}.{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl ViewFinder for FileViewFinder {
    fn find(&self, name: &str) -> Result<PathBuf> {
        let found = match name.split_once(HINT_PATH_DELIMITER) {
            Some((namespace, view)) => self
                .hints
                .get(namespace)
                .and_then(|paths| self.find_in(paths, view)),
            None => self.find_in(&self.paths, name),
        };

        found.ok_or_else(|| Error::ViewNotFound {
            name: name.to_string(),
        })
    }
}

/// Derives the default alias for a dotted view path: the last segment.
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_of_dotted_path() {
        assert_eq!(basename("shared.errors"), "errors");
        assert_eq!(basename("alert"), "alert");
    }
}
