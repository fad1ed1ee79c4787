//! The `@error` directive: renders its body when the error bag in the data
//! context has messages for a field, binding `$message` to the first one.

use super::expression;

pub(super) fn compile_error(expr: Option<&str>) -> String {
    format!("<?view error {} ?>", expression(expr))
}

pub(super) fn compile_enderror() -> String {
    "<?view enderror ?>".to_string()
}
