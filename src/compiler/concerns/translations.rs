//! Translation directives: `@lang`, `@endlang`, `@choice`.

use super::expression;

/// Three forms: bare `@lang` opens a key-capture region; `@lang([...])`
/// opens a capture with replacement parameters; `@lang('key', ...)` echoes
/// the translated line directly.
pub(super) fn compile_lang(expr: Option<&str>) -> String {
    match expr {
        None => "<?view lang ?>".to_string(),
        Some(_) => {
            let inner = expression(expr);
            if inner.starts_with('[') {
                format!("<?view lang {inner} ?>")
            } else {
                format!("<?view echo trans({inner}) ?>")
            }
        }
    }
}

pub(super) fn compile_endlang() -> String {
    "<?view endlang ?>".to_string()
}

pub(super) fn compile_choice(expr: Option<&str>) -> String {
    format!("<?view echo trans_choice({}) ?>", expression(expr))
}
