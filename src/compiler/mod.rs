//! Template compiler.
//!
//! Turns template source into a cached artifact: plain text interleaved with
//! `<?view ... ?>` code tags that the evaluation engine executes. One
//! [`Compiler::compile_string`] call runs the full pipeline:
//!
//! 1. raw-block extraction (`@verbatim`, `@php`) and comment stripping
//! 2. component tag precompilation (`<x-...>` to `@component` directives)
//! 3. user precompilers
//! 4. the token pass: text between existing code tags runs extensions,
//!    then statements (`@...`), then echoes (`{{ }}` families)
//! 5. raw-block restoration and footer append (`@extends` layouts)
//!
//! All per-call scratch lives in a [`CompileState`] value, so a shared
//! compiler reference can compile templates without interference.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::finder::{ViewFinder, basename};
use crate::fs::Files;
use crate::value::Value;

pub(crate) mod component_tags;
mod concerns;
mod echoes;
mod raw;
mod statements;

/// Extension given to compiled artifacts in the cache directory.
const COMPILED_EXTENSION: &str = "rsv";

/// A registered `@directive` handler: receives the inner expression (argument
/// group minus the outer parentheses) and returns replacement text.
pub type DirectiveHandler = Box<dyn Fn(&str) -> String>;

/// A registered custom-conditional predicate, consulted by `check(..)` at
/// render time.
pub type Condition = Box<dyn Fn(&[Value]) -> bool>;

/// A source-to-source pass over template text.
pub type Precompiler = Box<dyn Fn(&str) -> String>;

/// What a class component renders: a view plus the data it exposes.
pub struct Component {
    pub view: String,
    pub data: Value,
}

/// Factory producing a [`Component`] from the evaluated attribute data.
pub type ComponentFactory = Box<dyn Fn(&Value) -> Component>;

struct AutoloadRule {
    tag_prefix: String,
    root: String,
}

/// Per-compile scratch: extracted raw blocks and queued layout footers.
#[derive(Default)]
pub(crate) struct CompileState {
    pub(crate) raw_blocks: Vec<String>,
    pub(crate) footer: Vec<String>,
}

pub struct Compiler {
    files: Arc<dyn Files>,
    cache_path: PathBuf,
    finder: Option<Arc<dyn ViewFinder>>,
    custom_directives: HashMap<String, DirectiveHandler>,
    conditions: HashMap<String, Condition>,
    extensions: Vec<Precompiler>,
    precompilers: Vec<Precompiler>,
    class_components: HashMap<String, ComponentFactory>,
    component_aliases: HashMap<String, String>,
    component_namespaces: Vec<(String, String)>,
    component_autoload: Vec<AutoloadRule>,
    echo_format: String,
    always_recompile: bool,
}

impl Compiler {
    /// Creates a compiler writing artifacts under `cache_path`.
    pub fn new(files: Arc<dyn Files>, cache_path: impl Into<PathBuf>) -> Result<Self> {
        let cache_path = cache_path.into();
        if cache_path.as_os_str().is_empty() {
            return Err(Error::syntax("please provide a valid cache path"));
        }
        Ok(Compiler {
            files,
            cache_path,
            finder: None,
            custom_directives: HashMap::new(),
            conditions: HashMap::new(),
            extensions: Vec::new(),
            precompilers: Vec::new(),
            class_components: HashMap::new(),
            component_aliases: HashMap::new(),
            component_namespaces: Vec::new(),
            component_autoload: Vec::new(),
            echo_format: "esc(%s)".to_string(),
            always_recompile: false,
        })
    }

    /// Attaches the view finder used for anonymous component resolution.
    pub fn set_finder(&mut self, finder: Arc<dyn ViewFinder>) {
        self.finder = Some(finder);
    }

    /// Recompile on every request, ignoring artifact freshness.
    pub fn set_always_recompile(&mut self, on: bool) {
        self.always_recompile = on;
    }

    // ===== registration =====

    /// Registers a custom `@name` directive. Custom handlers win over the
    /// builtin directive set.
    pub fn directive(
        &mut self,
        name: &str,
        handler: impl Fn(&str) -> String + 'static,
    ) -> Result<()> {
        if !valid_directive_name(name) {
            return Err(Error::InvalidDirectiveName {
                name: name.to_string(),
            });
        }
        self.custom_directives
            .insert(name.to_string(), Box::new(handler));
        Ok(())
    }

    /// Registers a custom conditional. Synthesizes `@<name>`, `@unless<name>`,
    /// `@else<name>` and `@end<name>`, all reaching `predicate` through the
    /// `check` builtin at render time.
    pub fn condition(
        &mut self,
        name: &str,
        predicate: impl Fn(&[Value]) -> bool + 'static,
    ) -> Result<()> {
        if !valid_directive_name(name) {
            return Err(Error::InvalidDirectiveName {
                name: name.to_string(),
            });
        }
        self.conditions.insert(name.to_string(), Box::new(predicate));

        let check = |name: String| {
            move |expr: &str| {
                if expr.is_empty() {
                    format!("check('{name}')")
                } else {
                    format!("check('{name}', {expr})")
                }
            }
        };
        {
            let check = check(name.to_string());
            self.directive(name, move |expr| format!("<?view if {} ?>", check(expr)))?;
        }
        {
            let check = check(name.to_string());
            self.directive(&format!("unless{name}"), move |expr| {
                format!("<?view if !({}) ?>", check(expr))
            })?;
        }
        {
            let check = check(name.to_string());
            self.directive(&format!("else{name}"), move |expr| {
                format!("<?view elseif {} ?>", check(expr))
            })?;
        }
        self.directive(&format!("end{name}"), |_| "<?view endif ?>".to_string())
    }

    /// Evaluates a registered conditional. Render-time counterpart of
    /// [`Compiler::condition`].
    pub fn check(&self, name: &str, args: &[Value]) -> Result<bool> {
        let predicate = self
            .conditions
            .get(name)
            .ok_or_else(|| Error::UnknownCondition {
                name: name.to_string(),
            })?;
        Ok(predicate(args))
    }

    /// Registers a pass over raw template text, run before the statement
    /// scanner inside the token pass.
    pub fn extend(&mut self, extension: impl Fn(&str) -> String + 'static) {
        self.extensions.push(Box::new(extension));
    }

    /// Registers a pass over the whole template, run before token scanning.
    pub fn precompiler(&mut self, precompiler: impl Fn(&str) -> String + 'static) {
        self.precompilers.push(Box::new(precompiler));
    }

    /// Registers a class component under `key`, reachable from tags as
    /// `<x-{prefix-}alias>`. The alias defaults to the last dotted segment
    /// of the key.
    pub fn component(
        &mut self,
        key: &str,
        alias: Option<&str>,
        prefix: &str,
        factory: impl Fn(&Value) -> Component + 'static,
    ) {
        self.class_components
            .insert(key.to_string(), Box::new(factory));
        self.alias_for(key, alias, prefix);
    }

    /// Bulk registration of class components under a shared tag prefix, each
    /// with its default alias.
    pub fn components(
        &mut self,
        components: impl IntoIterator<Item = (String, ComponentFactory)>,
        prefix: &str,
    ) {
        for (key, factory) in components {
            self.class_components.insert(key.clone(), factory);
            self.alias_for(&key, None, prefix);
        }
    }

    /// Registers an anonymous component: the tag renders `view` directly with
    /// the attribute data.
    pub fn component_view(&mut self, view: &str, alias: Option<&str>, prefix: &str) {
        self.alias_for(view, alias, prefix);
    }

    /// Registers a namespace root: `<x-{prefix}::rest>` resolves under
    /// `{root}.rest`.
    pub fn component_namespace(&mut self, root: &str, prefix: &str) {
        self.component_namespaces
            .push((prefix.to_string(), root.to_string()));
    }

    /// Registers an autoload rule: tags starting with `tag_prefix` resolve
    /// under `root` without per-component registration.
    pub fn component_autoload(&mut self, tag_prefix: &str, root: &str) {
        self.component_autoload.push(AutoloadRule {
            tag_prefix: tag_prefix.to_string(),
            root: root.to_string(),
        });
    }

    fn alias_for(&mut self, key: &str, alias: Option<&str>, prefix: &str) {
        let alias = alias.unwrap_or_else(|| basename(key));
        let tag = if prefix.is_empty() {
            alias.to_string()
        } else {
            format!("{prefix}-{alias}")
        };
        self.component_aliases.insert(tag, key.to_string());
    }

    /// Registers `@alias(data)` as shorthand for including `view`.
    pub fn alias_include(&mut self, view: &str, alias: Option<&str>) -> Result<()> {
        let alias = alias.unwrap_or_else(|| basename(view)).to_string();
        let view = view.to_string();
        self.directive(&alias, move |expr| {
            let data = if expr.is_empty() { "[]" } else { expr };
            format!("<?view include '{view}', {data} ?>")
        })
    }

    /// Registers `@alias(data) ... @end<alias>` as shorthand for a component
    /// block over `view`.
    pub fn alias_component(&mut self, view: &str, alias: Option<&str>) -> Result<()> {
        let alias = alias.unwrap_or_else(|| basename(view)).to_string();
        let target = view.to_string();
        self.directive(&alias, move |expr| {
            let data = if expr.is_empty() { "[]" } else { expr };
            format!("<?view component '{target}', {data} ?>")
        })?;
        self.directive(&format!("end{alias}"), |_| {
            "<?view endcomponent ?>".to_string()
        })
    }

    /// Sets the sprintf-style format standard echoes compile through.
    pub fn set_echo_format(&mut self, format: impl Into<String>) {
        self.echo_format = format.into();
    }

    /// Standard echoes escape entities in already-encoded input again.
    pub fn with_double_encoding(&mut self) {
        self.set_echo_format("esc(%s, true)");
    }

    /// Standard echoes leave existing entities in place.
    pub fn without_double_encoding(&mut self) {
        self.set_echo_format("esc(%s, false)");
    }

    // ===== registry access =====

    pub(crate) fn custom_directive(&self, name: &str) -> Option<&DirectiveHandler> {
        self.custom_directives.get(name)
    }

    pub(crate) fn echo_format(&self) -> &str {
        &self.echo_format
    }

    /// The registered factory for a class component key.
    pub(crate) fn component_class(&self, key: &str) -> Option<&ComponentFactory> {
        self.class_components.get(key)
    }

    /// Resolves a component tag name to a class key or view name. Used at
    /// compile time for static tags and at render time for dynamic ones.
    pub(crate) fn resolve_component(&self, name: &str) -> Result<String> {
        if let Some(key) = self.component_aliases.get(name) {
            return Ok(key.clone());
        }
        if self.class_components.contains_key(name) {
            return Ok(name.to_string());
        }
        if let Some((ns, rest)) = name.split_once("::") {
            for (prefix, root) in &self.component_namespaces {
                if prefix == ns {
                    let key = format!("{root}.{}", rest.replace(':', "."));
                    if self.known_component(&key) {
                        return Ok(key);
                    }
                }
            }
        }
        for rule in &self.component_autoload {
            if let Some(rest) = name.strip_prefix(rule.tag_prefix.as_str()) {
                let rest = rest.trim_start_matches(['-', '.']);
                if !rest.is_empty() {
                    let key = format!("{}.{rest}", rule.root);
                    if self.known_component(&key) {
                        return Ok(key);
                    }
                }
            }
        }
        if let Some(finder) = &self.finder {
            let candidate = format!("components.{}", name.replace(':', "."));
            if finder.exists(&candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::UnresolvedComponent {
            tag: name.to_string(),
        })
    }

    fn known_component(&self, key: &str) -> bool {
        self.class_components.contains_key(key)
            || self.finder.as_ref().is_some_and(|f| f.exists(key))
    }

    // ===== compilation =====

    /// Compiles the template at `path` and writes the artifact to the cache.
    pub fn compile(&self, path: &Path) -> Result<()> {
        let contents = self.files.get(path)?;
        let compiled = self.compile_string(&contents)?;
        let compiled = append_file_path(&compiled, path);
        let target = self.compiled_path(path);
        debug!(template = %path.display(), artifact = %target.display(), "compiled");
        self.files.put(&target, &compiled)
    }

    /// Runs the full compile pipeline over template source.
    pub fn compile_string(&self, value: &str) -> Result<String> {
        let mut state = CompileState::default();

        let result = raw::store_uncompiled_blocks(value, &mut state);
        let result = raw::strip_comments(&result);
        let mut result = component_tags::compile(self, &result)?;
        for precompiler in &self.precompilers {
            result = precompiler(&result);
        }

        let mut out = String::with_capacity(result.len());
        for token in tokenize(&result) {
            match token {
                Token::Tag(text) => out.push_str(text),
                Token::Text(text) => {
                    let mut text = text.to_string();
                    for extension in &self.extensions {
                        text = extension(&text);
                    }
                    let text = statements::compile(self, &text, &mut state);
                    out.push_str(&echoes::compile(self, &text));
                }
            }
        }

        let result = raw::restore_raw_content(&out, &mut state);
        if state.footer.is_empty() {
            Ok(result)
        } else {
            Ok(append_footers(&result, &state.footer))
        }
    }

    // ===== cache gate =====

    /// Whether the artifact for `path` must be (re)built.
    pub fn is_expired(&self, path: &Path) -> Result<bool> {
        if self.always_recompile {
            return Ok(true);
        }
        let compiled = self.compiled_path(path);
        if !self.files.exists(&compiled) {
            return Ok(true);
        }
        Ok(self.files.last_modified(path)? >= self.files.last_modified(&compiled)?)
    }

    /// Cache location of the artifact for `path`.
    pub fn compiled_path(&self, path: &Path) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        self.cache_path
            .join(format!("{:016x}.{COMPILED_EXTENSION}", hasher.finish()))
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Compiler {
        Compiler::new(Arc::new(crate::fs::StdFiles), "cache").unwrap()
    }
}

/// `name` or `name::sub`, word characters only.
fn valid_directive_name(name: &str) -> bool {
    let word =
        |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    match name.split_once("::") {
        Some((head, tail)) => word(head) && word(tail),
        None => word(name),
    }
}

/// Drops one layer of parentheses from a directive argument group.
pub(crate) fn strip_parentheses(expr: &str) -> &str {
    match expr.strip_prefix('(') {
        Some(inner) => inner.strip_suffix(')').unwrap_or(inner),
        None => expr,
    }
}

/// Tags the end-of-artifact source path so render faults can name the
/// template they came from.
fn append_file_path(contents: &str, path: &Path) -> String {
    format!("{contents}<?view /**PATH {} ENDPATH**/ ?>", path.display())
}

/// Layout footers queued by `@extends`, appended after the body in reverse
/// enqueue order.
fn append_footers(result: &str, footer: &[String]) -> String {
    let mut out = result.trim_start_matches('\n').to_string();
    out.push('\n');
    for (i, fragment) in footer.iter().rev().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(fragment);
    }
    out
}

enum Token<'a> {
    Text(&'a str),
    Tag(&'a str),
}

/// Splits compiled text into code tags and the text between them. An
/// unterminated tag runs to end of input.
fn tokenize(value: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = value;
    while let Some(at) = rest.find("<?view") {
        if at > 0 {
            tokens.push(Token::Text(&rest[..at]));
        }
        match rest[at..].find("?>") {
            Some(end) => {
                let end = at + end + 2;
                tokens.push(Token::Tag(&rest[at..end]));
                rest = &rest[end..];
            }
            None => {
                tokens.push(Token::Tag(&rest[at..]));
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    tokens
}
