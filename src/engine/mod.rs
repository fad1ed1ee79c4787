//! Rendering engine.
//!
//! [`CompilerEngine::get`] is the cache gate: recompile when the artifact is
//! missing or older than its source, then parse and evaluate the artifact.
//! Evaluation faults are wrapped with the path of the innermost in-flight
//! template, so a failure deep inside an include chain names the file that
//! actually broke.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::compiler::Compiler;
use crate::error::{Error, Result};
use crate::finder::ViewFinder;
use crate::fs::Files;
use crate::translate::Translator;
use crate::value::Value;

mod eval;
mod expr;
mod program;

use eval::{Evaluator, Vars};
use program::Program;

/// State shared by one outer render and everything it includes: captured
/// sections and stack pushes survive across nested templates, which is what
/// makes `@extends` layouts and `@stack` work (the child renders first, the
/// layout consumes what it captured).
#[derive(Default)]
pub(crate) struct RenderState {
    sections: HashMap<String, String>,
    section_stack: Vec<String>,
    pushes: HashMap<String, Vec<String>>,
}

pub struct CompilerEngine {
    pub(crate) compiler: Compiler,
    pub(crate) files: Arc<dyn Files>,
    pub(crate) finder: Arc<dyn ViewFinder>,
    pub(crate) translator: Arc<dyn Translator>,
}

impl CompilerEngine {
    pub fn new(
        mut compiler: Compiler,
        files: Arc<dyn Files>,
        finder: Arc<dyn ViewFinder>,
        translator: Arc<dyn Translator>,
    ) -> CompilerEngine {
        compiler.set_finder(Arc::clone(&finder));
        CompilerEngine {
            compiler,
            files,
            finder,
            translator,
        }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Registration methods (`directive`, `condition`, components, ...) live
    /// on the compiler.
    pub fn compiler_mut(&mut self) -> &mut Compiler {
        &mut self.compiler
    }

    /// Renders the template at `path` with `data`, recompiling first when
    /// the cached artifact is stale.
    pub fn get(&self, path: &Path, data: Value) -> Result<String> {
        let mut state = RenderState::default();
        let mut vars = scope_from(data)?;
        self.render_path(path, &mut vars, &mut state)
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.finder.exists(name)
    }

    pub(crate) fn render_path(
        &self,
        path: &Path,
        vars: &mut Vars,
        state: &mut RenderState,
    ) -> Result<String> {
        if self.compiler.is_expired(path)? {
            self.compiler.compile(path)?;
        } else {
            trace!(template = %path.display(), "artifact fresh");
        }
        let artifact = self.files.get(&self.compiler.compiled_path(path))?;
        let program = Program::parse(&artifact).map_err(|error| in_view(error, path))?;
        Evaluator::render(self, state, &program, vars).map_err(|error| in_view(error, path))
    }
}

/// Wraps a fault with the template it came from. Nested renders wrap first,
/// so the innermost view wins and outer frames pass the error through.
fn in_view(error: Error, path: &Path) -> Error {
    match error {
        wrapped @ Error::View { .. } => wrapped,
        other => Error::View {
            view: path.to_path_buf(),
            source: Box::new(other),
        },
    }
}

/// Render data must be an associative array (or nothing).
fn scope_from(data: Value) -> Result<Vars> {
    match data {
        Value::Object(entries) => Ok(entries.into_iter().collect()),
        Value::Null => Ok(Vars::new()),
        other => Err(Error::eval(format!(
            "render data must be an array, got {}",
            other.to_json()
        ))),
    }
}

#[cfg(test)]
mod tests;
