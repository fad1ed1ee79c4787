//! Built-in directive handlers.
//!
//! Each submodule groups the handlers for one family of directives, the way
//! Blade splits them into `Compiles*` concern traits. The [`compile`] match
//! table below replaces Blade's name-convention method lookup with an
//! explicit compile-time mapping.

mod components;
mod conditionals;
mod errors;
mod includes;
mod json;
mod layouts;
mod loops;
mod raw_code;
mod stacks;
mod translations;

use super::{CompileState, strip_parentheses};

/// Dispatches `name` to its built-in handler, passing the raw argument group
/// (parentheses included) exactly as matched. Returns `None` for unknown
/// names so the statement emits unchanged.
pub(crate) fn compile(name: &str, expr: Option<&str>, state: &mut CompileState) -> Option<String> {
    let out = match name {
        "if" => conditionals::compile_if(expr),
        "elseif" => conditionals::compile_elseif(expr),
        "else" => conditionals::compile_else(),
        "endif" | "endunless" | "endisset" | "endempty" => conditionals::compile_endif(),
        "unless" => conditionals::compile_unless(expr),
        "isset" => conditionals::compile_isset(expr),
        "empty" => conditionals::compile_empty(expr),

        "for" => loops::compile_for(expr),
        "endfor" => loops::compile_endfor(),
        "foreach" => loops::compile_foreach(expr),
        "endforeach" => loops::compile_endforeach(),
        "forelse" => loops::compile_forelse(expr),
        "endforelse" => loops::compile_endforelse(),
        "while" => loops::compile_while(expr),
        "endwhile" => loops::compile_endwhile(),
        "break" => loops::compile_break(expr),
        "continue" => loops::compile_continue(expr),

        "extends" => layouts::compile_extends(expr, state),
        "section" => layouts::compile_section(expr),
        "endsection" | "stop" => layouts::compile_endsection(),
        "overwrite" => layouts::compile_overwrite(),
        "show" => layouts::compile_show(),
        "yield" => layouts::compile_yield(expr),
        "parent" => layouts::compile_parent(),

        "include" => includes::compile_include(expr),
        "includeIf" => includes::compile_include_if(expr),
        "includeWhen" => includes::compile_include_when(expr),
        "includeUnless" => includes::compile_include_unless(expr),
        "includeFirst" => includes::compile_include_first(expr),
        "each" => includes::compile_each(expr),

        "push" => stacks::compile_push(expr),
        "endpush" | "endprepend" => stacks::compile_endpush(),
        "prepend" => stacks::compile_prepend(expr),
        "stack" => stacks::compile_stack(expr),

        "component" => components::compile_component(expr),
        "endcomponent" => components::compile_endcomponent(),
        "slot" => components::compile_slot(expr),
        "endslot" => components::compile_endslot(),

        "lang" => translations::compile_lang(expr),
        "endlang" => translations::compile_endlang(),
        "choice" => translations::compile_choice(expr),

        "json" => json::compile_json(expr),

        "error" => errors::compile_error(expr),
        "enderror" => errors::compile_enderror(),

        "php" => raw_code::compile_php(expr),

        _ => return None,
    };
    Some(out)
}

/// The inner expression of an argument group, or `""` when absent.
fn expression(expr: Option<&str>) -> &str {
    expr.map(|e| strip_parentheses(e).trim()).unwrap_or("")
}
