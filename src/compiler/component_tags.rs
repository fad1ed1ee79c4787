//! Component tag precompilation.
//!
//! Rewrites the HTML-like component syntax into the directive form the
//! statement pass consumes:
//!
//! ```text
//! <x-alert type="error" :message="$message">...</x-alert>
//!     ⇒ @component('alert', ['type' => 'error', 'message' => $message])...@endcomponent
//! <x-slot name="title">...</x-slot>   ⇒ @slot('title')...@endslot
//! <x-dynamic-component :component="$name" />
//!     ⇒ @component($name, [])@endcomponent
//! ```
//!
//! Open and close tags are rewritten independently in one left-to-right
//! scan, so nested tags pair up innermost-first by construction. Component
//! names resolve at compile time (alias registry, then namespace roots, then
//! autoload rules, then the anonymous `components.<name>` view convention);
//! an unresolvable name aborts the compile naming the offending tag.

use crate::error::{Error, Result};

use super::Compiler;

/// The bound attribute naming the target of a dynamic component.
const DYNAMIC_COMPONENT: &str = "dynamic-component";

/// One parsed tag attribute.
#[derive(Debug, PartialEq)]
enum Attribute {
    /// `attr="value"` or bare `attr` — a compile-time constant.
    Literal { name: String, value: String },
    /// Bare boolean attribute.
    Flag { name: String },
    /// `:attr="expr"` — a runtime expression.
    Bound { name: String, expr: String },
}

impl Attribute {
    fn name(&self) -> &str {
        match self {
            Attribute::Literal { name, .. }
            | Attribute::Flag { name }
            | Attribute::Bound { name, .. } => name,
        }
    }

    /// The expression this attribute contributes to the data array.
    fn expr(&self) -> String {
        match self {
            Attribute::Literal { value, .. } => quote_string(value),
            Attribute::Flag { .. } => "true".to_string(),
            Attribute::Bound { expr, .. } => expr.clone(),
        }
    }
}

/// Compiles all component tags in `value`.
pub(crate) fn compile(compiler: &Compiler, value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(at) = find_tag_start(rest) {
        out.push_str(&rest[..at]);
        let tag = &rest[at..];

        match compile_tag(compiler, tag)? {
            Some((replacement, consumed)) => {
                out.push_str(&replacement);
                rest = &tag[consumed..];
            }
            None => {
                // Not a well-formed component tag after all.
                out.push('<');
                rest = &tag[1..];
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Finds the next `<x-`, `<x:` or `</x...` candidate.
fn find_tag_start(value: &str) -> Option<usize> {
    let mut search = 0;
    while let Some(at) = value[search..].find('<') {
        let at = search + at;
        let rest = &value[at..];
        if rest.starts_with("<x-")
            || rest.starts_with("<x:")
            || rest.starts_with("</x-")
            || rest.starts_with("</x:")
        {
            return Some(at);
        }
        search = at + 1;
    }
    None
}

/// Compiles one tag starting at the beginning of `tag`. Returns the
/// replacement text and the number of consumed bytes, or `None` when the
/// candidate is not a parsable tag.
fn compile_tag(compiler: &Compiler, tag: &str) -> Result<Option<(String, usize)>> {
    if let Some(rest) = tag.strip_prefix("</x") {
        let rest = &rest[1..]; // the `-` or `:` separator
        let Some(end) = rest.find('>') else {
            return Ok(None);
        };
        let name = rest[..end].trim();
        let replacement = if name == "slot" || name.starts_with("slot:") {
            "@endslot".to_string()
        } else {
            "@endcomponent".to_string()
        };
        return Ok(Some((replacement, "</x".len() + 1 + end + 1)));
    }

    let rest = &tag["<x".len() + 1..]; // past `<x-` / `<x:`
    let Some(name_len) = scan_tag_name(rest) else {
        return Ok(None);
    };
    let name = &rest[..name_len];

    let Some((attributes, self_closing, attrs_len)) = parse_attributes(&rest[name_len..]) else {
        return Ok(None);
    };
    let consumed = "<x".len() + 1 + name_len + attrs_len;

    if name == "slot" || name.starts_with("slot:") {
        let slot_name = match name.strip_prefix("slot:") {
            Some(shorthand) => quote_string(shorthand),
            None => attributes
                .iter()
                .find(|a| a.name() == "name")
                .map(|a| a.expr())
                .ok_or_else(|| Error::syntax("slot tag is missing a name"))?,
        };
        let mut replacement = format!("@slot({slot_name})");
        if self_closing {
            replacement.push_str("@endslot");
        }
        return Ok(Some((replacement, consumed)));
    }

    let (target, attributes) = if name == DYNAMIC_COMPONENT {
        let expr = attributes
            .iter()
            .find(|a| a.name() == "component")
            .map(Attribute::expr)
            .ok_or_else(|| Error::syntax("dynamic component is missing :component"))?;
        let rest: Vec<_> = attributes
            .into_iter()
            .filter(|a| a.name() != "component")
            .collect();
        (expr, rest)
    } else {
        (quote_string(&compiler.resolve_component(name)?), attributes)
    };

    let data = attributes_array(&attributes);
    let mut replacement = format!("@component({target}, {data})");
    if self_closing {
        replacement.push_str("@endcomponent");
    }
    Ok(Some((replacement, consumed)))
}

/// Length of a tag name: word characters plus `-`, `.`, `:`.
fn scan_tag_name(s: &str) -> Option<usize> {
    let len = s
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b':' | b'_'))
        .count();
    (len > 0).then_some(len)
}

/// Parses the attribute list up to and including the closing `>` / `/>`.
/// Returns the attributes, whether the tag was self-closing, and the number
/// of bytes consumed. `None` when the tag never closes.
fn parse_attributes(s: &str) -> Option<(Vec<Attribute>, bool, usize)> {
    let mut attributes = Vec::new();
    let mut pos = 0;
    let bytes = s.as_bytes();

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return None,
            Some(b'>') => return Some((attributes, false, pos + 1)),
            Some(b'/') if s[pos..].starts_with("/>") => {
                return Some((attributes, true, pos + 2));
            }
            _ => {}
        }

        let (attribute, len) = parse_attribute(&s[pos..])?;
        attributes.push(attribute);
        pos += len;
    }
}

/// Parses a single attribute at the start of `s`.
fn parse_attribute(s: &str) -> Option<(Attribute, usize)> {
    let mut pos = 0;

    // `::attr` escapes to a literal `:attr` name; `:attr` binds; `:$var` is
    // the bind-variable shorthand.
    let (bound, literal_colon) = if s.starts_with("::") {
        pos += 2;
        (false, true)
    } else if s.starts_with(':') {
        pos += 1;
        (true, false)
    } else {
        (false, false)
    };

    if bound && s[pos..].starts_with('$') {
        let name_len = scan_attr_name(&s[pos + 1..])?;
        let var = &s[pos + 1..pos + 1 + name_len];
        let attribute = Attribute::Bound {
            name: var.to_string(),
            expr: format!("${var}"),
        };
        return Some((attribute, pos + 1 + name_len));
    }

    let name_len = scan_attr_name(&s[pos..])?;
    let raw_name = &s[pos..pos + name_len];
    let name = if literal_colon {
        format!(":{raw_name}")
    } else {
        raw_name.to_string()
    };
    pos += name_len;

    if !s[pos..].starts_with('=') {
        let attribute = if bound {
            Attribute::Bound {
                name: name.clone(),
                expr: format!("${name}"),
            }
        } else {
            Attribute::Flag { name }
        };
        return Some((attribute, pos));
    }
    pos += 1;

    let (value, value_len) = parse_attribute_value(&s[pos..])?;
    pos += value_len;

    let attribute = if bound {
        Attribute::Bound { name, expr: value }
    } else {
        Attribute::Literal { name, value }
    };
    Some((attribute, pos))
}

fn scan_attr_name(s: &str) -> Option<usize> {
    let len = s
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'@'))
        .count();
    (len > 0).then_some(len)
}

/// Parses a quoted or bare attribute value; returns the raw text.
fn parse_attribute_value(s: &str) -> Option<(String, usize)> {
    match s.as_bytes().first()? {
        quote @ (b'"' | b'\'') => {
            let end = s[1..].find(*quote as char)?;
            Some((s[1..1 + end].to_string(), end + 2))
        }
        _ => {
            let len = s
                .bytes()
                .take_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'>' | b'/'))
                .count();
            (len > 0).then(|| (s[..len].to_string(), len))
        }
    }
}

/// Renders the attribute list as a data-array expression.
fn attributes_array(attributes: &[Attribute]) -> String {
    if attributes.is_empty() {
        return "[]".to_string();
    }
    let pairs: Vec<String> = attributes
        .iter()
        .map(|a| format!("{} => {}", quote_string(a.name()), a.expr()))
        .collect();
    format!("[{}]", pairs.join(", "))
}

/// Quotes a compile-time string as an expression literal.
fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;

    fn compiler_with_alert() -> Compiler {
        let mut compiler = Compiler::for_tests();
        compiler.component_view("components.alert", Some("alert"), "");
        compiler
    }

    #[test]
    fn paired_tag_compiles_to_component_directives() {
        let out = compile(&compiler_with_alert(), "<x-alert>hi</x-alert>").unwrap();
        assert_eq!(out, "@component('components.alert', [])hi@endcomponent");
    }

    #[test]
    fn attributes_become_data_array() {
        let out = compile(
            &compiler_with_alert(),
            r#"<x-alert type="error" :message="$message" required/>"#,
        )
        .unwrap();
        assert_eq!(
            out,
            "@component('components.alert', ['type' => 'error', 'message' => $message, 'required' => true])@endcomponent"
        );
    }

    #[test]
    fn bind_variable_shorthand() {
        let out = compile(&compiler_with_alert(), "<x-alert :$message/>").unwrap();
        assert_eq!(
            out,
            "@component('components.alert', ['message' => $message])@endcomponent"
        );
    }

    #[test]
    fn double_colon_escapes_to_literal_attribute() {
        let out = compile(&compiler_with_alert(), r#"<x-alert ::class="x"/>"#).unwrap();
        assert_eq!(
            out,
            "@component('components.alert', [':class' => 'x'])@endcomponent"
        );
    }

    #[test]
    fn slots_compile_to_slot_directives() {
        let out = compile(
            &compiler_with_alert(),
            r#"<x-alert><x-slot name="title">T</x-slot></x-alert>"#,
        )
        .unwrap();
        assert_eq!(
            out,
            "@component('components.alert', [])@slot('title')T@endslot@endcomponent"
        );
    }

    #[test]
    fn slot_shorthand_name() {
        let out = compile(&compiler_with_alert(), "<x-slot:title>T</x-slot>").unwrap();
        assert_eq!(out, "@slot('title')T@endslot");
    }

    #[test]
    fn dynamic_component_defers_resolution() {
        let out = compile(
            &Compiler::for_tests(),
            r#"<x-dynamic-component :component="$name" :message="$m"/>"#,
        )
        .unwrap();
        assert_eq!(
            out,
            "@component($name, ['message' => $m])@endcomponent"
        );
    }

    #[test]
    fn unresolved_component_is_a_hard_error() {
        let err = compile(&Compiler::for_tests(), "<x-other/>").unwrap_err();
        assert!(matches!(err, Error::UnresolvedComponent { tag } if tag == "other"));
    }

    #[test]
    fn nested_tags_resolve_innermost_first() {
        let mut compiler = compiler_with_alert();
        compiler.component_view("components.badge", Some("badge"), "");
        let out = compile(&compiler, "<x-alert><x-badge>1</x-badge></x-alert>").unwrap();
        assert_eq!(
            out,
            "@component('components.alert', [])@component('components.badge', [])1@endcomponent@endcomponent"
        );
    }

    #[test]
    fn non_component_markup_untouched() {
        let html = "<div class=\"x\"><span>ok</span></div>";
        assert_eq!(compile(&Compiler::for_tests(), html).unwrap(), html);
    }
}
