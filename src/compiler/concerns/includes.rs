//! Include directives: `@include` and its conditional variants, `@each`.

use super::expression;

pub(super) fn compile_include(expr: Option<&str>) -> String {
    format!("<?view include {} ?>", expression(expr))
}

pub(super) fn compile_include_if(expr: Option<&str>) -> String {
    format!("<?view includeif {} ?>", expression(expr))
}

pub(super) fn compile_include_when(expr: Option<&str>) -> String {
    format!("<?view includewhen {} ?>", expression(expr))
}

pub(super) fn compile_include_unless(expr: Option<&str>) -> String {
    format!("<?view includeunless {} ?>", expression(expr))
}

pub(super) fn compile_include_first(expr: Option<&str>) -> String {
    format!("<?view includefirst {} ?>", expression(expr))
}

pub(super) fn compile_each(expr: Option<&str>) -> String {
    format!("<?view each {} ?>", expression(expr))
}
