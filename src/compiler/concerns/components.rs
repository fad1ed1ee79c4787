//! Component directives: `@component`, `@slot` and their end pairs.
//!
//! These are the directive forms the component tag precompiler targets;
//! templates may also write them by hand.

use super::expression;

pub(super) fn compile_component(expr: Option<&str>) -> String {
    format!("<?view component {} ?>", expression(expr))
}

pub(super) fn compile_endcomponent() -> String {
    "<?view endcomponent ?>".to_string()
}

pub(super) fn compile_slot(expr: Option<&str>) -> String {
    format!("<?view slot {} ?>", expression(expr))
}

pub(super) fn compile_endslot() -> String {
    "<?view endslot ?>".to_string()
}
