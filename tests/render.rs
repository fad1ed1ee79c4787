//! Public-API integration tests: a realistic page assembled from a layout,
//! partials, components and stacks, rendered through [`viewforge::Factory`].

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use viewforge::{Factory, Value};

struct Site {
    dir: TempDir,
    factory: Factory,
}

impl Site {
    fn new() -> Site {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        fs::create_dir_all(&views).unwrap();
        let factory = Factory::new([views], dir.path().join("cache")).unwrap();
        Site { dir, factory }
    }

    fn view(&self, name: &str, source: &str) -> PathBuf {
        let path = self
            .dir
            .path()
            .join("views")
            .join(format!("{}.blade.html", name.replace('.', "/")));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, source).unwrap();
        path
    }
}

#[test]
fn full_page_with_layout_partials_and_components() {
    let site = Site::new();
    site.view(
        "layouts.app",
        "<html><head><title>@yield('title')</title>@stack('scripts')</head>\
         <body>@yield('content')</body></html>",
    );
    site.view("partials.nav", "<nav>{{ $active }}</nav>");
    site.view(
        "components.alert",
        "<div class=\"alert-{{ $level }}\">{{ $slot }}</div>",
    );
    site.view(
        "dashboard",
        "@extends('layouts.app')\
         @section('title', 'Dashboard')\
         @push('scripts')<script src=\"app.js\"></script>@endpush\
         @section('content')\
         @include('partials.nav', ['active' => 'home'])\
         <x-alert level=\"info\">Welcome, {{ $user }}!</x-alert>\
         @forelse ($tasks as $task)<li>{{ $task }}</li>@empty<p>Nothing due</p>@endforelse\
         @endsection",
    );

    let html = site
        .factory
        .render(
            "dashboard",
            Value::object([
                ("user", Value::from("ada")),
                (
                    "tasks",
                    Value::array([Value::from("write"), Value::from("ship")]),
                ),
            ]),
        )
        .unwrap();

    assert_eq!(
        html,
        "\n<html><head><title>Dashboard</title><script src=\"app.js\"></script></head>\
         <body><nav>home</nav><div class=\"alert-info\">Welcome, ada!</div>\
         <li>write</li><li>ship</li></body></html>"
    );

    let empty = site
        .factory
        .render(
            "dashboard",
            Value::object([("user", Value::from("ada")), ("tasks", Value::array([]))]),
        )
        .unwrap();
    assert!(empty.contains("<p>Nothing due</p>"));
}

#[test]
fn custom_directive_emits_replacement_text() {
    let mut site = Site::new();
    site.factory
        .compiler_mut()
        .directive("hello", |expr| format!("<?view echo 'hi ' . {expr} ?>"))
        .unwrap();
    site.view("home", "@hello($name)");
    let out = site
        .factory
        .render("home", Value::object([("name", Value::from("bob"))]))
        .unwrap();
    assert_eq!(out, "hi bob");
}

#[test]
fn always_recompile_picks_up_source_changes() {
    let mut site = Site::new();
    site.factory.compiler_mut().set_always_recompile(true);
    site.view("home", "v1");
    assert_eq!(site.factory.render("home", Value::Null).unwrap(), "v1");
    site.view("home", "v2");
    assert_eq!(site.factory.render("home", Value::Null).unwrap(), "v2");
}

#[test]
fn missing_views_error_by_name() {
    let site = Site::new();
    let err = site.factory.render("ghost", Value::Null).unwrap_err();
    assert!(err.to_string().contains("ghost"));
}
