//! Layout inheritance: `@extends`, `@section`, `@yield` and friends.
//!
//! `@extends` emits nothing inline; it enqueues the layout include on the
//! footer queue, which the orchestrator appends (reverse order) after the
//! body so sections declared anywhere in the child are registered before
//! the layout renders.

use super::super::CompileState;
use super::expression;

pub(super) fn compile_extends(expr: Option<&str>, state: &mut CompileState) -> String {
    state
        .footer
        .push(format!("<?view include {} ?>", expression(expr)));
    String::new()
}

pub(super) fn compile_section(expr: Option<&str>) -> String {
    format!("<?view section {} ?>", expression(expr))
}

pub(super) fn compile_endsection() -> String {
    "<?view endsection ?>".to_string()
}

pub(super) fn compile_overwrite() -> String {
    "<?view overwrite ?>".to_string()
}

pub(super) fn compile_show() -> String {
    "<?view show ?>".to_string()
}

pub(super) fn compile_yield(expr: Option<&str>) -> String {
    format!("<?view yield {} ?>", expression(expr))
}

pub(super) fn compile_parent() -> String {
    "<?view parent ?>".to_string()
}
