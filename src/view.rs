//! View factory: the user-facing entry point.
//!
//! Wires a [`FileViewFinder`], a [`Compiler`] and a [`CompilerEngine`]
//! together so callers deal in view names and data, not paths and artifacts.

use std::path::PathBuf;
use std::sync::Arc;

use crate::compiler::Compiler;
use crate::engine::CompilerEngine;
use crate::error::Result;
use crate::finder::FileViewFinder;
use crate::fs::{Files, StdFiles};
use crate::translate::{ArrayTranslator, Translator};
use crate::value::Value;

pub struct Factory {
    engine: CompilerEngine,
}

impl Factory {
    /// Creates a factory over `view_paths` caching artifacts in `cache_path`.
    pub fn new(
        view_paths: impl IntoIterator<Item = PathBuf>,
        cache_path: impl Into<PathBuf>,
    ) -> Result<Factory> {
        let files: Arc<dyn Files> = Arc::new(StdFiles);
        let finder = Arc::new(FileViewFinder::new(view_paths));
        let compiler = Compiler::new(Arc::clone(&files), cache_path)?;
        let translator: Arc<dyn Translator> = Arc::new(ArrayTranslator::default());
        Ok(Factory {
            engine: CompilerEngine::new(compiler, files, finder, translator),
        })
    }

    /// Full-control constructor for custom filesystems, finders or
    /// translators.
    pub fn with_engine(engine: CompilerEngine) -> Factory {
        Factory { engine }
    }

    pub fn engine(&self) -> &CompilerEngine {
        &self.engine
    }

    /// Registration surface (`directive`, `condition`, components, ...).
    pub fn compiler_mut(&mut self) -> &mut Compiler {
        self.engine.compiler_mut()
    }

    /// Whether a view name resolves to a template file.
    pub fn exists(&self, view: &str) -> bool {
        self.engine.finder.exists(view)
    }

    /// Resolves a view into a renderable [`View`].
    pub fn make(&self, view: &str, data: Value) -> Result<View<'_>> {
        let path = self.engine.finder.find(view)?;
        Ok(View {
            factory: self,
            name: view.to_string(),
            path,
            data,
        })
    }

    /// Renders a view by name.
    pub fn render(&self, view: &str, data: Value) -> Result<String> {
        self.make(view, data)?.render()
    }
}

/// A resolved view plus the data it will render with.
pub struct View<'f> {
    factory: &'f Factory,
    name: String,
    path: PathBuf,
    data: Value,
}

impl View<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn render(&self) -> Result<String> {
        self.factory.engine.get(&self.path, self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_renders_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        std::fs::create_dir_all(&views).unwrap();
        std::fs::write(views.join("hello.blade.html"), "hey {{ $who }}").unwrap();

        let factory = Factory::new([views], dir.path().join("cache")).unwrap();
        assert!(factory.exists("hello"));
        assert!(!factory.exists("ghost"));

        let out = factory
            .render("hello", Value::object([("who", Value::from("you"))]))
            .unwrap();
        assert_eq!(out, "hey you");

        let view = factory.make("hello", Value::Null).unwrap();
        assert_eq!(view.name(), "hello");
        assert!(view.path().ends_with("hello.blade.html"));
    }
}
