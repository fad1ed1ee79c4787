//! Conditional directives: `@if`, `@unless`, `@isset`, `@empty`.

use super::expression;

pub(super) fn compile_if(expr: Option<&str>) -> String {
    format!("<?view if {} ?>", expression(expr))
}

pub(super) fn compile_elseif(expr: Option<&str>) -> String {
    format!("<?view elseif {} ?>", expression(expr))
}

pub(super) fn compile_else() -> String {
    "<?view else ?>".to_string()
}

pub(super) fn compile_endif() -> String {
    "<?view endif ?>".to_string()
}

pub(super) fn compile_unless(expr: Option<&str>) -> String {
    format!("<?view if !({}) ?>", expression(expr))
}

pub(super) fn compile_isset(expr: Option<&str>) -> String {
    format!("<?view if isset({}) ?>", expression(expr))
}

/// `@empty($x)` opens a conditional; a bare `@empty` is the separator inside
/// `@forelse` and compiles to the loop's empty marker instead.
pub(super) fn compile_empty(expr: Option<&str>) -> String {
    match expr {
        Some(_) => format!("<?view if empty({}) ?>", expression(expr)),
        None => "<?view forelseempty ?>".to_string(),
    }
}
