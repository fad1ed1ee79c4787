//! Artifact evaluator.
//!
//! Walks a parsed [`Program`] against a variable scope and writes output
//! into string buffers, the way Blade's runtime captures nested content
//! with output buffering: sections, stacks, slots and translation keys all
//! evaluate their body into a fresh buffer and hand the captured text to
//! the matching runtime facility.

use std::collections::HashMap;

use crate::compiler::Component;
use crate::error::{Error, Result};
use crate::escape::escape;
use crate::value::Value;

use super::expr::{BinaryOp, Expr, SimpleStmt, UnaryOp};
use super::program::{Node, Program, SectionEnd};
use super::{CompilerEngine, RenderState};

/// Variable scope of one template frame.
pub(crate) type Vars = HashMap<String, Value>;

/// Control flow escaping a node list.
#[must_use]
enum Flow {
    Normal,
    Break(i64),
    Continue(i64),
}

pub(crate) struct Evaluator<'e> {
    engine: &'e CompilerEngine,
    state: &'e mut RenderState,
}

/// Marker a section body leaves where `@parent` appeared; replaced when a
/// parent layout extends the section, stripped on yield.
fn parent_placeholder(name: &str) -> String {
    format!("##parent-placeholder-{name}##")
}

impl<'e> Evaluator<'e> {
    pub(crate) fn render(
        engine: &'e CompilerEngine,
        state: &'e mut RenderState,
        program: &Program,
        vars: &mut Vars,
    ) -> Result<String> {
        let mut out = String::new();
        let mut evaluator = Evaluator { engine, state };
        match evaluator.eval_nodes(&program.nodes, vars, &mut out)? {
            Flow::Normal => Ok(out),
            Flow::Break(_) | Flow::Continue(_) => {
                Err(Error::eval("break or continue outside of a loop"))
            }
        }
    }

    fn eval_nodes(&mut self, nodes: &[Node], vars: &mut Vars, out: &mut String) -> Result<Flow> {
        for node in nodes {
            match self.eval_node(node, vars, out)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluates `nodes` into a fresh buffer.
    fn capture(&mut self, nodes: &[Node], vars: &mut Vars) -> Result<String> {
        let mut buffer = String::new();
        match self.eval_nodes(nodes, vars, &mut buffer)? {
            Flow::Normal => Ok(buffer),
            _ => Err(Error::eval("break or continue escaping a capture block")),
        }
    }

    fn eval_node(&mut self, node: &Node, vars: &mut Vars, out: &mut String) -> Result<Flow> {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Echo(expr) => {
                let value = self.eval(expr, vars)?;
                out.push_str(&value.render());
            }
            Node::Run(stmts) => {
                for stmt in stmts {
                    self.exec(stmt, vars)?;
                }
            }

            Node::If { arms, fallback } => {
                for (cond, body) in arms {
                    if self.eval(cond, vars)?.truthy() {
                        return self.eval_nodes(body, vars, out);
                    }
                }
                if let Some(fallback) = fallback {
                    return self.eval_nodes(fallback, vars, out);
                }
            }

            Node::Foreach {
                header,
                body,
                empty,
            } => {
                let subject = self.eval(&header.subject, vars)?;
                let entries = iterate(&subject)?;
                if entries.is_empty() {
                    if let Some(empty) = empty {
                        return self.eval_nodes(empty, vars, out);
                    }
                    return Ok(Flow::Normal);
                }
                for (key, value) in entries {
                    if let Some(key_var) = &header.key {
                        vars.insert(key_var.clone(), key);
                    }
                    vars.insert(header.value.clone(), value);
                    match self.eval_nodes(body, vars, out)? {
                        Flow::Normal | Flow::Continue(1) => {}
                        Flow::Break(1) => break,
                        Flow::Break(n) => return Ok(Flow::Break(n - 1)),
                        Flow::Continue(n) => return Ok(Flow::Continue(n - 1)),
                    }
                }
            }

            Node::For { header, body } => {
                for stmt in &header.init {
                    self.exec(stmt, vars)?;
                }
                loop {
                    if let Some(cond) = &header.cond
                        && !self.eval(cond, vars)?.truthy()
                    {
                        break;
                    }
                    match self.eval_nodes(body, vars, out)? {
                        Flow::Normal | Flow::Continue(1) => {}
                        Flow::Break(1) => break,
                        Flow::Break(n) => return Ok(Flow::Break(n - 1)),
                        Flow::Continue(n) => return Ok(Flow::Continue(n - 1)),
                    }
                    for stmt in &header.step {
                        self.exec(stmt, vars)?;
                    }
                }
            }

            Node::While { cond, body } => {
                while self.eval(cond, vars)?.truthy() {
                    match self.eval_nodes(body, vars, out)? {
                        Flow::Normal | Flow::Continue(1) => {}
                        Flow::Break(1) => break,
                        Flow::Break(n) => return Ok(Flow::Break(n - 1)),
                        Flow::Continue(n) => return Ok(Flow::Continue(n - 1)),
                    }
                }
            }

            Node::Break { levels, cond } => {
                if self.jump_taken(cond.as_ref(), vars)? {
                    return Ok(Flow::Break(*levels));
                }
            }
            Node::Continue { levels, cond } => {
                if self.jump_taken(cond.as_ref(), vars)? {
                    return Ok(Flow::Continue(*levels));
                }
            }

            Node::Section { name, body, end } => {
                let name = self.eval(name, vars)?.render();
                self.state.section_stack.push(name.clone());
                let content = self.capture(body, vars);
                self.state.section_stack.pop();
                let content = content?;
                match end {
                    SectionEnd::Stop => self.extend_section(&name, content),
                    SectionEnd::Overwrite => {
                        self.state.sections.insert(name, content);
                    }
                    SectionEnd::Show => {
                        self.extend_section(&name, content);
                        out.push_str(&self.yield_content(&name, String::new()));
                    }
                }
            }
            Node::InlineSection { name, value } => {
                let name = self.eval(name, vars)?.render();
                let content = self.eval(value, vars)?.render();
                self.extend_section(&name, content);
            }
            Node::Yield { name, default } => {
                let name = self.eval(name, vars)?.render();
                let default = match default {
                    Some(default) => self.eval(default, vars)?.render(),
                    None => String::new(),
                };
                out.push_str(&self.yield_content(&name, default));
            }
            Node::Parent => {
                let name = self
                    .state
                    .section_stack
                    .last()
                    .ok_or_else(|| Error::eval("@parent used outside of a section"))?;
                out.push_str(&parent_placeholder(name));
            }

            Node::Include {
                view,
                data,
                if_exists,
            } => {
                let name = self.eval(view, vars)?.render();
                if *if_exists && !self.engine.exists(&name) {
                    return Ok(Flow::Normal);
                }
                let scope = self.include_scope(vars, data.as_ref())?;
                let rendered = self.render_view(&name, scope)?;
                out.push_str(&rendered);
            }
            Node::IncludeWhen {
                cond,
                view,
                data,
                unless,
            } => {
                let taken = self.eval(cond, vars)?.truthy() != *unless;
                if taken {
                    let name = self.eval(view, vars)?.render();
                    let scope = self.include_scope(vars, data.as_ref())?;
                    let rendered = self.render_view(&name, scope)?;
                    out.push_str(&rendered);
                }
            }
            Node::IncludeFirst { views, data } => {
                let candidates = self.eval(views, vars)?;
                let Value::Array(candidates) = candidates else {
                    return Err(Error::eval("includefirst expects an array of view names"));
                };
                let name = candidates
                    .iter()
                    .map(Value::render)
                    .find(|name| self.engine.exists(name))
                    .ok_or_else(|| Error::ViewNotFound {
                        name: candidates
                            .iter()
                            .map(Value::render)
                            .collect::<Vec<_>>()
                            .join(", "),
                    })?;
                let scope = self.include_scope(vars, data.as_ref())?;
                let rendered = self.render_view(&name, scope)?;
                out.push_str(&rendered);
            }
            Node::Each {
                view,
                items,
                var,
                empty,
            } => {
                let view = self.eval(view, vars)?.render();
                let items = self.eval(items, vars)?;
                let var = self.eval(var, vars)?.render();
                let entries = iterate(&items)?;
                if entries.is_empty() {
                    if let Some(empty) = empty {
                        let empty = self.eval(empty, vars)?.render();
                        match empty.strip_prefix("raw|") {
                            Some(text) => out.push_str(text),
                            None => {
                                let rendered = self.render_view(&empty, Vars::new())?;
                                out.push_str(&rendered);
                            }
                        }
                    }
                    return Ok(Flow::Normal);
                }
                for (key, value) in entries {
                    let mut scope = Vars::new();
                    scope.insert("key".to_string(), key);
                    scope.insert(var.clone(), value);
                    let rendered = self.render_view(&view, scope)?;
                    out.push_str(&rendered);
                }
            }

            Node::Push {
                name,
                body,
                prepend,
            } => {
                let name = self.eval(name, vars)?.render();
                let content = self.capture(body, vars)?;
                self.push_stack(name, content, *prepend);
            }
            Node::InlinePush {
                name,
                value,
                prepend,
            } => {
                let name = self.eval(name, vars)?.render();
                let content = self.eval(value, vars)?.render();
                self.push_stack(name, content, *prepend);
            }
            Node::Stack { name } => {
                let name = self.eval(name, vars)?.render();
                if let Some(fragments) = self.state.pushes.get(&name) {
                    for fragment in fragments {
                        out.push_str(fragment);
                    }
                }
            }

            Node::Component { name, data, body } => {
                let rendered = self.render_component(name, data.as_ref(), body, vars)?;
                out.push_str(&rendered);
            }
            Node::Slot { .. } | Node::InlineSlot { .. } => {
                return Err(Error::eval("@slot used outside of a component"));
            }

            Node::Lang { replace, body } => {
                let key = self.capture(body, vars)?;
                let replace = match replace {
                    Some(replace) => self.eval(replace, vars)?,
                    None => Value::Null,
                };
                out.push_str(&self.engine.translator.get(key.trim(), &replace));
            }

            Node::ErrorBlock { name, body } => {
                let field = self.eval(name, vars)?.render();
                let bag = vars.get("errors").cloned().unwrap_or(Value::Null);
                if let Some(message) = bag.get(&field).cloned()
                    && message.truthy()
                {
                    let message = match message {
                        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
                        other => other,
                    };
                    let previous = vars.insert("message".to_string(), message);
                    let result = self.eval_nodes(body, vars, out);
                    match previous {
                        Some(previous) => {
                            vars.insert("message".to_string(), previous);
                        }
                        None => {
                            vars.remove("message");
                        }
                    }
                    return result;
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn jump_taken(&mut self, cond: Option<&Expr>, vars: &mut Vars) -> Result<bool> {
        match cond {
            Some(cond) => Ok(self.eval(cond, vars)?.truthy()),
            None => Ok(true),
        }
    }

    // ===== sections =====

    /// Merges a capture into an existing section: the placeholder the child's
    /// capture left behind is filled with the parent's content.
    fn extend_section(&mut self, name: &str, content: String) {
        let merged = match self.state.sections.get(name) {
            Some(existing) => existing.replace(&parent_placeholder(name), &content),
            None => content,
        };
        self.state.sections.insert(name.to_string(), merged);
    }

    fn yield_content(&self, name: &str, default: String) -> String {
        match self.state.sections.get(name) {
            Some(content) => content.replace(&parent_placeholder(name), ""),
            None => default,
        }
    }

    // ===== stacks =====

    fn push_stack(&mut self, name: String, content: String, prepend: bool) {
        let fragments = self.state.pushes.entry(name).or_default();
        if prepend {
            fragments.insert(0, content);
        } else {
            fragments.push(content);
        }
    }

    // ===== includes =====

    /// Included views see the caller's variables plus the explicit data.
    fn include_scope(&mut self, vars: &mut Vars, data: Option<&Expr>) -> Result<Vars> {
        let mut scope = vars.clone();
        if let Some(data) = data {
            match self.eval(data, vars)? {
                Value::Object(entries) => {
                    for (key, value) in entries {
                        scope.insert(key, value);
                    }
                }
                Value::Null => {}
                _ => return Err(Error::eval("include data must be an array")),
            }
        }
        Ok(scope)
    }

    fn render_view(&mut self, name: &str, mut scope: Vars) -> Result<String> {
        let path = self.engine.finder.find(name)?;
        self.engine.render_path(&path, &mut scope, self.state)
    }

    // ===== components =====

    fn render_component(
        &mut self,
        name: &Expr,
        data: Option<&Expr>,
        body: &[Node],
        vars: &mut Vars,
    ) -> Result<String> {
        let raw = self.eval(name, vars)?.render();
        let key = self.resolve_component_key(&raw)?;
        let attrs = match data {
            Some(data) => self.eval(data, vars)?,
            None => Value::Object(Vec::new()),
        };

        // Body splits into the default slot and named slots.
        let mut default_slot = String::new();
        let mut slots: Vec<(String, String)> = Vec::new();
        for child in body {
            match child {
                Node::Slot { name, body } => {
                    let slot_name = self.eval(name, vars)?.render();
                    let content = self.capture(body, vars)?;
                    slots.push((slot_name, content));
                }
                Node::InlineSlot { name, value } => {
                    let slot_name = self.eval(name, vars)?.render();
                    let content = self.eval(value, vars)?.render();
                    slots.push((slot_name, content));
                }
                other => match self.eval_node(other, vars, &mut default_slot)? {
                    Flow::Normal => {}
                    _ => return Err(Error::eval("break or continue escaping a component body")),
                },
            }
        }

        let mut scope = Vars::new();
        let view = match self.engine.compiler.component_class(&key) {
            Some(factory) => {
                let Component { view, data } = factory(&attrs);
                if let Value::Object(entries) = &attrs {
                    for (k, v) in entries {
                        scope.insert(k.clone(), v.clone());
                    }
                }
                if let Value::Object(entries) = data {
                    for (k, v) in entries {
                        scope.insert(k, v);
                    }
                }
                view
            }
            None => {
                if let Value::Object(entries) = &attrs {
                    for (k, v) in entries {
                        scope.insert(k.clone(), v.clone());
                    }
                }
                key.clone()
            }
        };
        scope.insert("attributes".to_string(), attrs);
        scope.insert("slot".to_string(), Value::Str(default_slot));
        for (slot_name, content) in slots {
            scope.insert(slot_name, Value::Str(content));
        }
        self.render_view(&view, scope)
    }

    /// Compile-time tags arrive already resolved; dynamic components may
    /// still carry an alias or raw view name.
    fn resolve_component_key(&self, raw: &str) -> Result<String> {
        if self.engine.compiler.component_class(raw).is_some() || self.engine.exists(raw) {
            return Ok(raw.to_string());
        }
        self.engine.compiler.resolve_component(raw)
    }

    // ===== statements =====

    fn exec(&mut self, stmt: &SimpleStmt, vars: &mut Vars) -> Result<()> {
        match stmt {
            SimpleStmt::Assign { target, value } => {
                let value = self.eval(value, vars)?;
                self.assign(target, value, vars)
            }
            SimpleStmt::AddAssign { target, value } => {
                let delta = self.eval(value, vars)?;
                self.numeric_update(target, vars, |old| {
                    apply_binary(BinaryOp::Add, &old, &delta)
                })
            }
            SimpleStmt::SubAssign { target, value } => {
                let delta = self.eval(value, vars)?;
                self.numeric_update(target, vars, |old| {
                    apply_binary(BinaryOp::Sub, &old, &delta)
                })
            }
            SimpleStmt::Incr { target } => self.numeric_update(target, vars, |old| {
                apply_binary(BinaryOp::Add, &old, &Value::Int(1))
            }),
            SimpleStmt::Decr { target } => self.numeric_update(target, vars, |old| {
                apply_binary(BinaryOp::Sub, &old, &Value::Int(1))
            }),
            SimpleStmt::Expr(expr) => {
                self.eval(expr, vars)?;
                Ok(())
            }
        }
    }

    fn numeric_update(
        &mut self,
        target: &Expr,
        vars: &mut Vars,
        update: impl FnOnce(Value) -> Result<Value>,
    ) -> Result<()> {
        let old = self.eval(target, vars)?;
        let old = if old.is_null() { Value::Int(0) } else { old };
        let new = update(old)?;
        self.assign(target, new, vars)
    }

    /// Writes through a `$var`, `$var['k']` or `$var->k` target path,
    /// creating intermediate containers as needed.
    fn assign(&mut self, target: &Expr, value: Value, vars: &mut Vars) -> Result<()> {
        let (root, path) = self.target_path(target, vars)?;
        let mut slot = vars.entry(root).or_insert(Value::Null);
        for segment in path {
            slot = descend(slot, &segment)?;
        }
        *slot = value;
        Ok(())
    }

    fn target_path(&mut self, target: &Expr, vars: &mut Vars) -> Result<(String, Vec<Value>)> {
        let mut path = Vec::new();
        let mut current = target;
        loop {
            match current {
                Expr::Var(name) => {
                    path.reverse();
                    return Ok((name.clone(), path));
                }
                Expr::Member(base, name) => {
                    path.push(Value::Str(name.clone()));
                    current = base;
                }
                Expr::Index(base, index) => {
                    path.push(self.eval(index, vars)?);
                    current = base;
                }
                other => {
                    return Err(Error::eval(format!(
                        "cannot assign through {other:?}"
                    )));
                }
            }
        }
    }

    // ===== expressions =====

    fn eval(&mut self, expr: &Expr, vars: &mut Vars) -> Result<Value> {
        Ok(match expr {
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(n) => Value::Int(*n),
            Expr::Float(f) => Value::Float(*f),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Var(name) => vars.get(name).cloned().unwrap_or(Value::Null),

            Expr::Array(entries) => {
                // Any keyed entry makes the literal an object.
                let keyed = entries.iter().any(|(key, _)| key.is_some());
                if keyed {
                    let mut pairs = Vec::with_capacity(entries.len());
                    for (key, value) in entries {
                        let value = self.eval(value, vars)?;
                        let key = match key {
                            Some(key) => self.eval(key, vars)?.render(),
                            None => pairs.len().to_string(),
                        };
                        pairs.push((key, value));
                    }
                    Value::Object(pairs)
                } else {
                    let mut items = Vec::with_capacity(entries.len());
                    for (_, value) in entries {
                        items.push(self.eval(value, vars)?);
                    }
                    Value::Array(items)
                }
            }

            Expr::Member(base, name) => {
                let base = self.eval(base, vars)?;
                base.get(name).cloned().unwrap_or(Value::Null)
            }
            Expr::Index(base, index) => {
                let base = self.eval(base, vars)?;
                let index = self.eval(index, vars)?;
                base.index(&index).cloned().unwrap_or(Value::Null)
            }

            Expr::Unary(op, inner) => {
                let inner = self.eval(inner, vars)?;
                match op {
                    UnaryOp::Not => Value::Bool(!inner.truthy()),
                    UnaryOp::Neg => match inner {
                        Value::Int(n) => Value::Int(-n),
                        other => {
                            let n = other.as_number().ok_or_else(|| {
                                Error::eval("cannot negate a non-numeric value")
                            })?;
                            Value::Float(-n)
                        }
                    },
                }
            }

            Expr::Binary(op, left, right) => match op {
                BinaryOp::And => {
                    let taken =
                        self.eval(left, vars)?.truthy() && self.eval(right, vars)?.truthy();
                    Value::Bool(taken)
                }
                BinaryOp::Or => {
                    let taken =
                        self.eval(left, vars)?.truthy() || self.eval(right, vars)?.truthy();
                    Value::Bool(taken)
                }
                BinaryOp::Coalesce => {
                    let left = self.eval(left, vars)?;
                    if left.is_null() {
                        self.eval(right, vars)?
                    } else {
                        left
                    }
                }
                _ => {
                    let left = self.eval(left, vars)?;
                    let right = self.eval(right, vars)?;
                    apply_binary(*op, &left, &right)?
                }
            },

            Expr::Ternary(cond, then, fallback) => {
                let cond = self.eval(cond, vars)?;
                if cond.truthy() {
                    match then {
                        Some(then) => self.eval(then, vars)?,
                        // Elvis form keeps the condition value.
                        None => cond,
                    }
                } else {
                    self.eval(fallback, vars)?
                }
            }

            Expr::Call(name, args) => return self.call(name, args, vars),
        })
    }

    /// The builtin function surface of the expression language.
    fn call(&mut self, name: &str, args: &[Expr], vars: &mut Vars) -> Result<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, vars)?);
        }
        match name {
            "esc" => {
                let text = values.first().map(Value::render).unwrap_or_default();
                let double_encode = values.get(1).is_none_or(Value::truthy);
                Ok(Value::Str(escape(&text, double_encode)))
            }
            "json" => Ok(Value::Str(
                values.first().unwrap_or(&Value::Null).to_json(),
            )),
            "trans" => {
                let key = values.first().map(Value::render).unwrap_or_default();
                let replace = values.get(1).cloned().unwrap_or(Value::Null);
                Ok(Value::Str(self.engine.translator.get(&key, &replace)))
            }
            "trans_choice" => {
                let key = values.first().map(Value::render).unwrap_or_default();
                let count = values
                    .get(1)
                    .and_then(Value::as_number)
                    .ok_or_else(|| Error::eval("trans_choice needs a numeric count"))?
                    as i64;
                let replace = values.get(2).cloned().unwrap_or(Value::Null);
                Ok(Value::Str(
                    self.engine.translator.choice(&key, count, &replace),
                ))
            }
            "check" => {
                let condition = values.first().map(Value::render).unwrap_or_default();
                Ok(Value::Bool(
                    self.engine.compiler.check(&condition, &values[1..])?,
                ))
            }
            "isset" => Ok(Value::Bool(
                !values.is_empty() && values.iter().all(|v| !v.is_null()),
            )),
            "empty" => Ok(Value::Bool(
                !values.first().is_some_and(Value::truthy),
            )),
            "count" => Ok(Value::Int(
                values.first().map(Value::len).unwrap_or(0) as i64
            )),
            other => Err(Error::eval(format!("call to unknown function `{other}`"))),
        }
    }
}

/// Entries a `foreach` visits: `(key, value)` pairs.
fn iterate(subject: &Value) -> Result<Vec<(Value, Value)>> {
    match subject {
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Int(i as i64), v.clone()))
            .collect()),
        Value::Object(entries) => Ok(entries
            .iter()
            .map(|(k, v)| (Value::Str(k.clone()), v.clone()))
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::eval(format!(
            "cannot iterate over {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Str(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Concat => Ok(Value::Str(format!("{}{}", left.render(), right.render()))),
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(right))),
        BinaryOp::Same => Ok(Value::Bool(left == right)),
        BinaryOp::NotSame => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = left.compare(right);
            let taken = ordering.is_some_and(|ordering| match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            });
            Ok(Value::Bool(taken))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let (a, b) = numeric_pair(op, left, right)?;
            if let (Value::Int(x), Value::Int(y)) = (left, right)
                && !matches!(op, BinaryOp::Div)
            {
                return Ok(Value::Int(match op {
                    BinaryOp::Add => x + y,
                    BinaryOp::Sub => x - y,
                    BinaryOp::Mul => x * y,
                    _ => {
                        if *y == 0 {
                            return Err(Error::eval("modulo by zero"));
                        }
                        x % y
                    }
                }));
            }
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => {
                    if b == 0.0 {
                        return Err(Error::eval("division by zero"));
                    }
                    a / b
                }
                _ => {
                    if b == 0.0 {
                        return Err(Error::eval("modulo by zero"));
                    }
                    a % b
                }
            };
            Ok(Value::Float(result))
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => {
            unreachable!("short-circuit operators are handled by the evaluator")
        }
    }
}

fn numeric_pair(op: BinaryOp, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::eval(format!(
            "non-numeric operand for {op:?}: {} and {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

/// Steps one path segment into a container, creating it when absent.
fn descend<'v>(slot: &'v mut Value, segment: &Value) -> Result<&'v mut Value> {
    if slot.is_null() {
        *slot = match segment {
            Value::Int(_) => Value::Array(Vec::new()),
            _ => Value::Object(Vec::new()),
        };
    }
    match slot {
        Value::Object(entries) => {
            let key = segment.render();
            let at = entries.iter().position(|(k, _)| *k == key);
            let at = match at {
                Some(at) => at,
                None => {
                    entries.push((key, Value::Null));
                    entries.len() - 1
                }
            };
            Ok(&mut entries[at].1)
        }
        Value::Array(items) => {
            let index = segment
                .as_number()
                .ok_or_else(|| Error::eval("non-numeric array index in assignment"))?
                as usize;
            if index == items.len() {
                items.push(Value::Null);
            }
            items
                .get_mut(index)
                .ok_or_else(|| Error::eval("array index out of bounds in assignment"))
        }
        _ => Err(Error::eval("cannot assign into a scalar value")),
    }
}
