//! Inline `@php(...)` statements.
//!
//! Block form `@php ... @endphp` never reaches the statement pass: the
//! raw-block extractor already stored it as a pass-through `run` tag. A
//! bare `@php` with no argument group re-emits literally, matching Blade.

use super::expression;

pub(super) fn compile_php(expr: Option<&str>) -> String {
    match expr {
        Some(_) => format!("<?view run {} ?>", expression(expr)),
        None => "@php".to_string(),
    }
}
