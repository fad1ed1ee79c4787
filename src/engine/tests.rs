//! End-to-end render tests: templates on disk, compiled through the cache
//! and evaluated with real includes, layouts, components and stacks.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tempfile::TempDir;

use super::CompilerEngine;
use crate::compiler::{Compiler, Component};
use crate::error::{Error, Result};
use crate::finder::FileViewFinder;
use crate::fs::{Files, StdFiles};
use crate::translate::ArrayTranslator;
use crate::value::Value;

/// [`Files`] wrapper recording artifact writes, to observe the cache gate.
struct SpyFiles {
    inner: StdFiles,
    puts: Mutex<Vec<PathBuf>>,
}

impl SpyFiles {
    fn new() -> SpyFiles {
        SpyFiles {
            inner: StdFiles,
            puts: Mutex::new(Vec::new()),
        }
    }

    fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }
}

impl Files for SpyFiles {
    fn get(&self, path: &Path) -> Result<String> {
        self.inner.get(path)
    }

    fn put(&self, path: &Path, contents: &str) -> Result<()> {
        self.puts.lock().unwrap().push(path.to_path_buf());
        self.inner.put(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn last_modified(&self, path: &Path) -> Result<SystemTime> {
        self.inner.last_modified(path)
    }
}

struct Harness {
    dir: TempDir,
    files: Arc<SpyFiles>,
    engine: CompilerEngine,
}

impl Harness {
    fn new() -> Harness {
        Self::build(ArrayTranslator::default())
    }

    fn build(translator: ArrayTranslator) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let files: Arc<SpyFiles> = Arc::new(SpyFiles::new());
        let finder = Arc::new(FileViewFinder::new([dir.path().join("views")]));
        let compiler = Compiler::new(files.clone(), dir.path().join("cache")).unwrap();
        let engine = CompilerEngine::new(compiler, files.clone(), finder, Arc::new(translator));
        Harness { dir, files, engine }
    }

    /// Writes a view source file, `name` in dotted notation.
    fn view(&self, name: &str, source: &str) -> PathBuf {
        let path = self
            .dir
            .path()
            .join("views")
            .join(format!("{}.blade.html", name.replace('.', "/")));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, source).unwrap();
        path
    }

    fn render(&self, name: &str, data: Value) -> Result<String> {
        let path = self.engine.finder.find(name)?;
        self.engine.get(&path, data)
    }
}

fn data<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    Value::object(pairs)
}

#[test]
fn renders_escaped_and_raw_echoes() {
    let h = Harness::new();
    h.view("home", "hi {{ $name }} / {!! $name !!}");
    let out = h
        .render("home", data([("name", Value::from("<b>x</b>"))]))
        .unwrap();
    assert_eq!(out, "hi &lt;b&gt;x&lt;/b&gt; / <b>x</b>");
}

#[test]
fn undefined_variables_render_empty() {
    let h = Harness::new();
    h.view("home", "[{{ $missing }}]");
    assert_eq!(h.render("home", Value::Null).unwrap(), "[]");
}

#[test]
fn layout_with_sections_and_defaults() {
    let h = Harness::new();
    h.view(
        "layout",
        "<title>@yield('title', 'Default')</title>@yield('content')",
    );
    h.view(
        "page",
        "@extends('layout')@section('title', 'Home')@section('content')Body@endsection",
    );
    assert_eq!(
        h.render("page", Value::Null).unwrap(),
        "\n<title>Home</title>Body"
    );

    h.view("bare", "@extends('layout')");
    assert_eq!(
        h.render("bare", Value::Null).unwrap(),
        "\n<title>Default</title>"
    );
}

#[test]
fn parent_directive_merges_layout_content() {
    let h = Harness::new();
    h.view("layout", "@section('side')L@show");
    h.view(
        "page",
        "@extends('layout')@section('side')@parent C@endsection",
    );
    assert_eq!(h.render("page", Value::Null).unwrap(), "\nL C");
}

#[test]
fn include_shares_scope_and_merges_data() {
    let h = Harness::new();
    h.view("partial", "{{ $outer }}-{{ $inner }}");
    h.view("home", "@include('partial', ['inner' => 'i'])");
    assert_eq!(
        h.render("home", data([("outer", Value::from("o"))])).unwrap(),
        "o-i"
    );
}

#[test]
fn include_if_skips_missing_views() {
    let h = Harness::new();
    h.view("home", "a@includeIf('nope')b");
    assert_eq!(h.render("home", Value::Null).unwrap(), "ab");
}

#[test]
fn foreach_and_forelse() {
    let h = Harness::new();
    h.view(
        "list",
        "@forelse ($items as $i => $item)[{{ $i }}:{{ $item }}]@empty none@endforelse",
    );
    let items = Value::array([Value::from("a"), Value::from("b")]);
    assert_eq!(
        h.render("list", data([("items", items)])).unwrap(),
        "[0:a][1:b]"
    );
    assert_eq!(
        h.render("list", data([("items", Value::array([]))])).unwrap(),
        " none"
    );
}

#[test]
fn nested_loops_with_break_levels() {
    let h = Harness::new();
    h.view(
        "grid",
        "@foreach ($rows as $r)@foreach ($r as $c){{ $c }}@break(2)@endforeach@endforeach",
    );
    let rows = Value::array([
        Value::array([Value::from(1i64), Value::from(2i64)]),
        Value::array([Value::from(3i64)]),
    ]);
    assert_eq!(h.render("grid", data([("rows", rows)])).unwrap(), "1");
}

#[test]
fn while_and_php_blocks() {
    let h = Harness::new();
    h.view(
        "count",
        "@php $i = 0; @endphp@while ($i < 3){{ $i }}@php $i++; @endphp@endwhile",
    );
    assert_eq!(h.render("count", Value::Null).unwrap(), "012");
}

#[test]
fn stacks_collect_pushes_from_children() {
    let h = Harness::new();
    h.view("layout", "<head>@stack('scripts')</head>@yield('content')");
    h.view(
        "page",
        "@extends('layout')@push('scripts')<s1>@endpush@section('content')X@endsection@prepend('scripts')<s0>@endpush",
    );
    assert_eq!(
        h.render("page", Value::Null).unwrap(),
        "\n<head><s0><s1></head>X"
    );
}

#[test]
fn anonymous_component_with_slots() {
    let h = Harness::new();
    h.view(
        "components.alert",
        "<div class=\"{{ $type }}\"><h1>{{ $title }}</h1>{{ $slot }}</div>",
    );
    h.view(
        "page",
        "<x-alert type=\"warn\"><x-slot name=\"title\">T</x-slot>Body</x-alert>",
    );
    assert_eq!(
        h.render("page", Value::Null).unwrap(),
        "<div class=\"warn\"><h1>T</h1>Body</div>"
    );
}

#[test]
fn class_component_factory_controls_view_and_data() {
    let mut h = Harness::new();
    h.view("components.badge", "<b>{{ $label }}:{{ $level }}</b>");
    h.engine.compiler_mut().component(
        "app.badge",
        Some("badge"),
        "",
        |attrs: &Value| Component {
            view: "components.badge".to_string(),
            data: Value::object([(
                "label",
                attrs.get("label").cloned().unwrap_or(Value::from("?")),
            )]),
        },
    );
    h.view("page", "<x-badge label=\"new\" level=\"3\"/>");
    assert_eq!(h.render("page", Value::Null).unwrap(), "<b>new:3</b>");
}

#[test]
fn dynamic_component_resolves_at_render_time() {
    let h = Harness::new();
    h.view("components.alert", "A:{{ $slot }}");
    h.view(
        "page",
        "<x-dynamic-component :component=\"$which\">hi</x-dynamic-component>",
    );
    assert_eq!(
        h.render("page", data([("which", Value::from("alert"))])).unwrap(),
        "A:hi"
    );
}

#[test]
fn each_renders_per_item_views() {
    let h = Harness::new();
    h.view("item", "({{ $key }}:{{ $it }})");
    h.view("list", "@each('item', $items, 'it', 'raw|empty')");
    let items = Value::array([Value::from("x"), Value::from("y")]);
    assert_eq!(
        h.render("list", data([("items", items)])).unwrap(),
        "(0:x)(1:y)"
    );
    assert_eq!(
        h.render("list", data([("items", Value::array([]))])).unwrap(),
        "empty"
    );
}

#[test]
fn translations_through_lang_and_choice() {
    let mut translator = ArrayTranslator::default();
    translator.add_line("greeting", "Hello :name");
    translator.add_line("apples", "one apple|:count apples");
    let h = Harness::build(translator);
    h.view(
        "home",
        "@lang(['name' => $who])greeting@endlang, @choice('apples', 3)",
    );
    assert_eq!(
        h.render("home", data([("who", Value::from("ada"))])).unwrap(),
        "Hello ada, 3 apples"
    );
}

#[test]
fn error_directive_binds_message() {
    let h = Harness::new();
    h.view(
        "form",
        "@error('email')<span>{{ $message }}</span>@enderror@error('name')never@enderror",
    );
    let errors = Value::object([(
        "email",
        Value::array([Value::from("taken")]),
    )]);
    assert_eq!(
        h.render("form", data([("errors", errors)])).unwrap(),
        "<span>taken</span>"
    );
}

#[test]
fn custom_conditions_reach_their_predicate() {
    let mut h = Harness::new();
    h.engine
        .compiler_mut()
        .condition("env", |args| args.first().is_some_and(|v| v.render() == "prod"))
        .unwrap();
    h.view("home", "@env('prod')P@elseenv D@endenv");
    assert_eq!(h.render("home", Value::Null).unwrap(), "P");
}

#[test]
fn cache_gate_compiles_once_until_stale() {
    let mut h = Harness::new();
    h.view("home", "hi");
    h.render("home", Value::Null).unwrap();
    h.render("home", Value::Null).unwrap();
    assert_eq!(h.files.put_count(), 1);

    h.engine.compiler_mut().set_always_recompile(true);
    h.render("home", Value::Null).unwrap();
    assert_eq!(h.files.put_count(), 2);
}

#[test]
fn render_faults_name_the_innermost_view() {
    let h = Harness::new();
    h.view("broken", "{{ 1 / 0 }}");
    h.view("outer", "@include('broken')");
    let err = h.render("outer", Value::Null).unwrap_err();
    let Error::View { view, source } = err else {
        panic!("expected a view-wrapped error, got {err:?}");
    };
    assert!(view.ends_with("broken.blade.html"), "wrong view: {view:?}");
    assert!(matches!(*source, Error::Eval { .. }));
}

#[test]
fn missing_view_is_reported_by_name() {
    let h = Harness::new();
    h.view("home", "@include('ghost')");
    let err = h.render("home", Value::Null).unwrap_err();
    let Error::View { source, .. } = err else {
        panic!("expected view wrapping, got {err:?}");
    };
    assert!(matches!(*source, Error::ViewNotFound { ref name } if name == "ghost"));
}
