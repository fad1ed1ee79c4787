//! Translation lookup used by `@lang` and `@choice`.

use std::collections::HashMap;

use crate::value::Value;

/// Resolves translation keys at render time.
pub trait Translator {
    /// Looks up `key`, substituting `:name` placeholders from `replace`.
    fn get(&self, key: &str, replace: &Value) -> String;

    /// Pluralizing lookup: the line for `key` may contain `|`-separated
    /// singular/plural forms selected by `count`.
    fn choice(&self, key: &str, count: i64, replace: &Value) -> String {
        let line = self.get(key, replace);
        match line.split_once('|') {
            Some((one, many)) => {
                let chosen = if count == 1 { one } else { many };
                chosen.trim().replace(":count", &count.to_string())
            }
            None => line.replace(":count", &count.to_string()),
        }
    }
}

/// A map-backed [`Translator`]. Unknown keys echo back unchanged, which is
/// also what the default translator does when no lines are registered.
#[derive(Debug, Default)]
pub struct ArrayTranslator {
    lines: HashMap<String, String>,
}

impl ArrayTranslator {
    pub fn new(lines: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
        }
    }

    pub fn add_line(&mut self, key: &str, line: &str) {
        self.lines.insert(key.to_string(), line.to_string());
    }
}

impl Translator for ArrayTranslator {
    fn get(&self, key: &str, replace: &Value) -> String {
        let mut line = self
            .lines
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());

        if let Value::Object(pairs) = replace {
            for (name, value) in pairs {
                line = line.replace(&format!(":{name}"), &value.render());
            }
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_named_parameters() {
        let mut translator = ArrayTranslator::default();
        translator.add_line("greeting", "Hello :name");
        let replace = Value::object([("name", Value::from("fangx"))]);
        assert_eq!(translator.get("greeting", &replace), "Hello fangx");
    }

    #[test]
    fn choice_selects_plural_form() {
        let mut translator = ArrayTranslator::default();
        translator.add_line("apples", "one apple|:count apples");
        assert_eq!(translator.choice("apples", 1, &Value::Null), "one apple");
        assert_eq!(translator.choice("apples", 3, &Value::Null), "3 apples");
    }

    #[test]
    fn unknown_key_echoes_back() {
        let translator = ArrayTranslator::default();
        assert_eq!(translator.get("missing.key", &Value::Null), "missing.key");
    }
}
