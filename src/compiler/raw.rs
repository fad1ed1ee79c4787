//! Raw-block extraction and restoration.
//!
//! `@verbatim ... @endverbatim` regions and `@php ... @endphp` blocks must
//! not be touched by the directive and echo passes. Before anything else
//! runs, this module replaces each with a numbered placeholder of the form
//! `@__raw_block_<N>__@`; after the token pass, a single global substitution
//! restores the original bytes and clears the table.

use super::CompileState;

/// Stores the blocks that do not receive compilation.
pub(crate) fn store_uncompiled_blocks(value: &str, state: &mut CompileState) -> String {
    let mut value = value.to_string();
    if value.contains("@verbatim") {
        value = store_delimited(&value, "@verbatim", "@endverbatim", state, |content| {
            content.to_string()
        });
    }
    if value.contains("@php") {
        value = store_delimited(&value, "@php", "@endphp", state, |content| {
            format!("<?view run{content} ?>")
        });
    }
    value
}

/// Extracts `open ... close` regions, storing `wrap(content)` as a raw block.
///
/// An opener preceded by `@` is escaped and left for the statement pass; a
/// region with no closer is left untouched (the non-match policy).
fn store_delimited(
    value: &str,
    open: &str,
    close: &str,
    state: &mut CompileState,
    wrap: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(at) = rest.find(open) {
        let escaped = out.ends_with('@') && at == 0 || rest[..at].ends_with('@');
        let after_open = &rest[at + open.len()..];

        if escaped {
            out.push_str(&rest[..at + open.len()]);
            rest = after_open;
            continue;
        }

        match after_open.find(close) {
            Some(end) => {
                out.push_str(&rest[..at]);
                out.push_str(&store_raw_block(state, &wrap(&after_open[..end])));
                rest = &after_open[end + close.len()..];
            }
            None => {
                out.push_str(&rest[..at + open.len()]);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Stores a raw block and returns its unique placeholder.
pub(crate) fn store_raw_block(state: &mut CompileState, value: &str) -> String {
    state.raw_blocks.push(value.to_string());
    placeholder(state.raw_blocks.len() - 1)
}

/// Formats the placeholder for raw block `index`.
fn placeholder(index: usize) -> String {
    format!("@__raw_block_{index}__@")
}

/// Replaces every placeholder with its stored content and clears the table.
pub(crate) fn restore_raw_content(result: &str, state: &mut CompileState) -> String {
    const OPEN: &str = "@__raw_block_";
    const CLOSE: &str = "__@";

    let mut out = String::with_capacity(result.len());
    let mut rest = result;

    while let Some(at) = rest.find(OPEN) {
        out.push_str(&rest[..at]);
        let after = &rest[at + OPEN.len()..];
        let digits: String = after.chars().take_while(char::is_ascii_digit).collect();

        if !digits.is_empty() && after[digits.len()..].starts_with(CLOSE) {
            let index: usize = digits.parse().expect("placeholder index");
            if let Some(block) = state.raw_blocks.get(index) {
                out.push_str(block);
            }
            rest = &after[digits.len() + CLOSE.len()..];
        } else {
            out.push_str(OPEN);
            rest = after;
        }
    }

    out.push_str(rest);
    state.raw_blocks.clear();
    out
}

/// Strips `{{-- ... --}}` comments. An unterminated comment is left as-is.
pub(crate) fn strip_comments(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(at) = rest.find("{{--") {
        match rest[at..].find("--}}") {
            Some(end) => {
                out.push_str(&rest[..at]);
                rest = &rest[at + end + "--}}".len()..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_round_trips() {
        let mut state = CompileState::default();
        let stored = store_uncompiled_blocks("a @verbatim {{ raw }} @endverbatim b", &mut state);
        assert_eq!(stored, "a @__raw_block_0__@ b");
        assert_eq!(state.raw_blocks.len(), 1);

        let restored = restore_raw_content(&stored, &mut state);
        assert_eq!(restored, "a  {{ raw }}  b");
        assert!(state.raw_blocks.is_empty());
    }

    #[test]
    fn php_blocks_become_run_tags() {
        let mut state = CompileState::default();
        let stored = store_uncompiled_blocks("@php $x = 1; @endphp", &mut state);
        assert_eq!(stored, "@__raw_block_0__@");
        assert_eq!(state.raw_blocks[0], "<?view run $x = 1;  ?>");
    }

    #[test]
    fn escaped_opener_is_not_extracted() {
        let mut state = CompileState::default();
        let stored = store_uncompiled_blocks("@@verbatim x @endverbatim", &mut state);
        assert!(state.raw_blocks.is_empty());
        assert_eq!(stored, "@@verbatim x @endverbatim");
    }

    #[test]
    fn unclosed_block_left_untouched() {
        let mut state = CompileState::default();
        let stored = store_uncompiled_blocks("@verbatim no closer", &mut state);
        assert!(state.raw_blocks.is_empty());
        assert_eq!(stored, "@verbatim no closer");
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(strip_comments("a{{-- note --}}b"), "ab");
        assert_eq!(strip_comments("{{-- open"), "{{-- open");
    }
}
