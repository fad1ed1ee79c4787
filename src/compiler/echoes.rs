//! Echo tag compilation.
//!
//! Three tag families, compiled in this order so the longer delimiters win:
//! raw `{!! !!}` (no escaping), legacy escaped `{{{ }}}` (always escaped),
//! and standard `{{ }}` (escaped through the configurable echo format).
//! A leading `@` suppresses interpretation and emits the literal tag.

use super::Compiler;

/// Compiles all echo tags in `value`.
pub(crate) fn compile(compiler: &Compiler, value: &str) -> String {
    let value = compile_pass(value, "{!!", "!!}", |expr| {
        format!("<?view echo {expr} ?>")
    });
    let value = compile_pass(&value, "{{{", "}}}", |expr| {
        format!("<?view echo esc({expr}) ?>")
    });
    compile_pass(&value, "{{", "}}", |expr| {
        format!("<?view echo {} ?>", compiler.echo_format().replace("%s", expr))
    })
}

/// One scan for a single `open ... close` echo family.
fn compile_pass(value: &str, open: &str, close: &str, render: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(at) = rest.find(open) {
        let escaped = rest[..at].ends_with('@');
        let after_open = &rest[at + open.len()..];

        let Some(end) = after_open.find(close) else {
            // No closing delimiter: not an echo tag.
            out.push_str(&rest[..at + open.len()]);
            rest = after_open;
            continue;
        };

        if escaped {
            // `@{{ ... }}` emits the literal tag minus the escape marker.
            out.push_str(&rest[..at - 1]);
            out.push_str(&rest[at..at + open.len() + end + close.len()]);
        } else {
            out.push_str(&rest[..at]);
            out.push_str(&render(after_open[..end].trim()));
        }
        rest = &after_open[end + close.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;

    fn compile_str(value: &str) -> String {
        compile(&Compiler::for_tests(), value)
    }

    #[test]
    fn standard_echo_uses_escape_format() {
        assert_eq!(compile_str("{{ $message }}"), "<?view echo esc($message) ?>");
    }

    #[test]
    fn raw_echo_skips_escaping() {
        assert_eq!(compile_str("{!! $html !!}"), "<?view echo $html ?>");
    }

    #[test]
    fn legacy_triple_brace_always_escapes() {
        assert_eq!(compile_str("{{{ $name }}}"), "<?view echo esc($name) ?>");
    }

    #[test]
    fn escaped_echo_is_literal() {
        assert_eq!(compile_str("@{{ name }}"), "{{ name }}");
        assert_eq!(compile_str("@{!! raw !!}"), "{!! raw !!}");
    }

    #[test]
    fn double_encoding_toggle_changes_format() {
        let mut compiler = Compiler::for_tests();
        compiler.without_double_encoding();
        assert_eq!(
            compile(&compiler, "{{ $m }}"),
            "<?view echo esc($m, false) ?>"
        );
        compiler.with_double_encoding();
        assert_eq!(
            compile(&compiler, "{{ $m }}"),
            "<?view echo esc($m, true) ?>"
        );
    }

    #[test]
    fn surrounding_text_preserved() {
        assert_eq!(
            compile_str("<h1>{{ $user }}</h1>\n"),
            "<h1><?view echo esc($user) ?></h1>\n"
        );
    }
}
