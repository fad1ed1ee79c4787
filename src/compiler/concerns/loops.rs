//! Loop directives: `@for`, `@foreach`, `@forelse`, `@while`, `@break`,
//! `@continue`.

use super::expression;

pub(super) fn compile_for(expr: Option<&str>) -> String {
    format!("<?view for {} ?>", expression(expr))
}

pub(super) fn compile_endfor() -> String {
    "<?view endfor ?>".to_string()
}

pub(super) fn compile_foreach(expr: Option<&str>) -> String {
    format!("<?view foreach {} ?>", expression(expr))
}

pub(super) fn compile_endforeach() -> String {
    "<?view endforeach ?>".to_string()
}

pub(super) fn compile_forelse(expr: Option<&str>) -> String {
    format!("<?view forelse {} ?>", expression(expr))
}

pub(super) fn compile_endforelse() -> String {
    "<?view endforelse ?>".to_string()
}

pub(super) fn compile_while(expr: Option<&str>) -> String {
    format!("<?view while {} ?>", expression(expr))
}

pub(super) fn compile_endwhile() -> String {
    "<?view endwhile ?>".to_string()
}

pub(super) fn compile_break(expr: Option<&str>) -> String {
    match expr {
        Some(_) => format!("<?view break {} ?>", expression(expr)),
        None => "<?view break ?>".to_string(),
    }
}

pub(super) fn compile_continue(expr: Option<&str>) -> String {
    match expr {
        Some(_) => format!("<?view continue {} ?>", expression(expr)),
        None => "<?view continue ?>".to_string(),
    }
}
