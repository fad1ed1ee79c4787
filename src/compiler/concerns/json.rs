//! The `@json` helper.

use super::expression;

pub(super) fn compile_json(expr: Option<&str>) -> String {
    format!("<?view echo json({}) ?>", expression(expr))
}
