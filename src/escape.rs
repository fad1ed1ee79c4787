//! HTML entity escaping for standard echo output.

/// Escapes HTML special characters in `input`.
///
/// With `double_encode` set, every `&` is escaped; without it, ampersands
/// that already begin an entity (`&amp;`, `&#38;`, `&#x26;`) are left alone,
/// matching the behavior templates get from the double-encoding toggle.
pub fn escape(input: &str, double_encode: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &input[i..];
        let c = rest.chars().next().expect("non-empty remainder");
        match c {
            '&' => {
                if !double_encode && starts_entity(rest) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
        i += c.len_utf8();
    }
    out
}

/// Returns true when `rest` (starting with `&`) looks like an HTML entity.
fn starts_entity(rest: &str) -> bool {
    let body = &rest[1..];
    let Some(end) = body.find(';') else {
        return false;
    };
    let name = &body[..end];
    if name.is_empty() {
        return false;
    }
    if let Some(digits) = name.strip_prefix('#') {
        let digits = digits.strip_prefix(['x', 'X']).unwrap_or(digits);
        return !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit());
    }
    name.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            escape("<a href=\"x\">'&'</a>", true),
            "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn double_encoding_toggle() {
        assert_eq!(escape("&amp; & &#38;", true), "&amp;amp; &amp; &amp;#38;");
        assert_eq!(escape("&amp; & &#38;", false), "&amp; &amp; &#38;");
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(escape("success", true), "success");
    }
}
