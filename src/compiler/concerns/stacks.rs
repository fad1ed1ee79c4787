//! Stack directives: `@push`, `@prepend`, `@stack`.

use super::expression;

pub(super) fn compile_push(expr: Option<&str>) -> String {
    format!("<?view push {} ?>", expression(expr))
}

pub(super) fn compile_endpush() -> String {
    "<?view endpush ?>".to_string()
}

pub(super) fn compile_prepend(expr: Option<&str>) -> String {
    format!("<?view prepend {} ?>", expression(expr))
}

pub(super) fn compile_stack(expr: Option<&str>) -> String {
    format!("<?view stack {} ?>", expression(expr))
}
