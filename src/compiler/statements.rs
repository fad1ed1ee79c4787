//! Directive statement matching.
//!
//! Scans template text for `@name` invocations and replaces them with
//! generated runtime code. The scanner reproduces Blade's matcher behavior
//! exactly: an `@` is a candidate only when not preceded by a word
//! character, names are `\w+` with an optional `::\w+` suffix, and the
//! argument group is captured by a counting-bracket scan that supports
//! arbitrary nesting. An unbalanced group is a silent non-match: the
//! directive compiles as argument-less and the `(` text stays literal.

use super::{CompileState, Compiler, concerns};

/// Compiles every directive statement in `value`.
pub(crate) fn compile(compiler: &Compiler, value: &str, state: &mut CompileState) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(at) = rest.find('@') {
        let prev = rest[..at].chars().next_back().or_else(|| out.chars().next_back());
        out.push_str(&rest[..at]);
        rest = &rest[at..];

        // `\B@`: an `@` right after a word character never starts a directive.
        if prev.is_some_and(is_word_char) {
            out.push('@');
            rest = &rest[1..];
            continue;
        }

        let body = &rest[1..];
        let (escaped, body) = match body.strip_prefix('@') {
            Some(stripped) => (true, stripped),
            None => (false, body),
        };

        let name_len = scan_name(body);
        if name_len == 0 {
            out.push('@');
            rest = &rest[1..];
            continue;
        }

        let name = &body[..name_len];
        let after_name = &body[name_len..];
        let ws_len = after_name
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        let (ws, after_ws) = after_name.split_at(ws_len);
        let args = after_ws
            .starts_with('(')
            .then(|| scan_balanced(after_ws))
            .flatten();

        let consumed = 1 + usize::from(escaped) + name_len + ws_len + args.map_or(0, str::len);

        let replacement = if escaped {
            // `@@name` re-emits as literal `@name`, never dispatched.
            Some(format!("@{name}"))
        } else if let Some(handler) = compiler.custom_directive(name) {
            Some(handler(args.map_or("", inner_expression)))
        } else {
            concerns::compile(name, args, state)
        };

        match replacement {
            Some(code) => {
                out.push_str(&code);
                match args {
                    // The gap between name and argument group is dropped.
                    Some(a) if escaped => out.push_str(a),
                    Some(_) => {}
                    // No argument list: trailing whitespace is preserved.
                    None => out.push_str(ws),
                }
            }
            None => {
                // No handler: the whole statement is emitted unchanged.
                out.push_str(&rest[..consumed]);
            }
        }
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Length of a directive name `\w+(::\w+)?` at the start of `s`.
fn scan_name(s: &str) -> usize {
    let base = s.bytes().take_while(|b| is_word_char(*b as char)).count();
    if base == 0 {
        return 0;
    }
    let rest = &s[base..];
    if let Some(after) = rest.strip_prefix("::") {
        let sub = after.bytes().take_while(|b| is_word_char(*b as char)).count();
        if sub > 0 {
            return base + 2 + sub;
        }
    }
    base
}

/// Captures a balanced parenthesized group at the start of `s`, including
/// the surrounding parentheses. Nesting depth is unbounded; quotes are not
/// interpreted, matching Blade's argument pattern.
fn scan_balanced(s: &str) -> Option<&str> {
    debug_assert!(s.starts_with('('));
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strips the surrounding parentheses from a captured argument group and
/// trims the result — the form custom directive handlers receive.
fn inner_expression(args: &str) -> &str {
    super::strip_parentheses(args).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;

    fn compile_str(value: &str) -> String {
        let compiler = Compiler::for_tests();
        let mut state = CompileState::default();
        compile(&compiler, value, &mut state)
    }

    #[test]
    fn escaped_directive_is_literal() {
        assert_eq!(compile_str("@@foo"), "@foo");
        assert_eq!(compile_str("@@if($x)"), "@if($x)");
    }

    #[test]
    fn at_after_word_char_is_ignored() {
        assert_eq!(compile_str("group@hyperf.io"), "group@hyperf.io");
    }

    #[test]
    fn unknown_directive_left_unchanged() {
        assert_eq!(compile_str("@nonsense('x') tail"), "@nonsense('x') tail");
        assert_eq!(compile_str("@media screen"), "@media screen");
    }

    #[test]
    fn nested_parentheses_captured_as_one_argument() {
        let out = compile_str("@if(a((b(c)), d))");
        assert_eq!(out, "<?view if a((b(c)), d) ?>");
    }

    #[test]
    fn unbalanced_group_is_a_silent_miss() {
        // The `(` never closes: `@endif` compiles, the rest stays literal.
        assert_eq!(compile_str("@endif((x"), "<?view endif ?>((x");
    }

    #[test]
    fn whitespace_preserved_without_arguments() {
        assert_eq!(
            compile_str("@else  tail"),
            "<?view else ?>  tail"
        );
        // ...and dropped between a directive and its argument group.
        assert_eq!(compile_str("@if ($x)"), "<?view if $x ?>");
    }

    #[test]
    fn custom_directive_receives_stripped_expression() {
        let mut compiler = Compiler::for_tests();
        compiler
            .directive("datetime", |expr| format!("<?view echo {expr} ?>"))
            .unwrap();
        let mut state = CompileState::default();
        let out = compile(&compiler, "@datetime($now)", &mut state);
        assert_eq!(out, "<?view echo $now ?>");
    }

    #[test]
    fn namespaced_directive_name() {
        let mut compiler = Compiler::for_tests();
        compiler
            .directive("app::version", |_| "1.0".to_string())
            .unwrap();
        let mut state = CompileState::default();
        assert_eq!(compile(&compiler, "@app::version", &mut state), "1.0");
    }
}
