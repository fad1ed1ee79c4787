//! Blade-style server-side template engine.
//!
//! Templates compile to cached text artifacts interleaved with
//! `<?view ... ?>` code tags, which a small evaluator executes against the
//! render data. The surface is the familiar directive language:
//!
//! - echoes: `{{ $x }}` (escaped), `{!! $x !!}` (raw), `{{{ $x }}}`
//! - control flow: `@if` / `@foreach` / `@forelse` / `@for` / `@while`
//! - layouts: `@extends`, `@section`, `@yield`, `@parent`, `@include`
//! - stacks, components (`<x-...>` tags and `@component`), `@lang`, `@error`
//!
//! # Example
//!
//! ```no_run
//! use viewforge::{Factory, Value};
//!
//! let factory = Factory::new(["resources/views".into()], "storage/cache")?;
//! let html = factory.render(
//!     "welcome",
//!     Value::object([("name", Value::from("ada"))]),
//! )?;
//! # Ok::<(), viewforge::Error>(())
//! ```
//!
//! Custom directives, conditionals and components register through
//! [`Compiler`], reachable as [`Factory::compiler_mut`].

mod compiler;
mod engine;
mod error;
mod escape;
mod finder;
mod fs;
mod translate;
mod value;
mod view;

pub use compiler::{Compiler, Component, ComponentFactory, DirectiveHandler, Precompiler};
pub use engine::CompilerEngine;
pub use error::{Error, Result};
pub use escape::escape;
pub use finder::{FileViewFinder, HINT_PATH_DELIMITER, ViewFinder};
pub use fs::{Files, StdFiles};
pub use translate::{ArrayTranslator, Translator};
pub use value::Value;
pub use view::{Factory, View};
