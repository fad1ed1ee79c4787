//! Compiled-artifact parser.
//!
//! An artifact is literal text interleaved with `<?view ... ?>` code tags.
//! This module splits the text into chunks, reads the leading keyword of
//! each tag and folds the flat chunk list into a [`Node`] tree: control-flow
//! tags nest, capture tags (`section`, `push`, `slot`, `lang`, `error`)
//! carry their body, everything else is a leaf. The trailing
//! `/**PATH ... ENDPATH**/` marker is lifted off into [`Program::source_path`]
//! so render faults can name their template.

use std::path::PathBuf;

use crate::error::{Error, Result};

use super::expr::{
    self, Expr, ForHeader, ForeachHeader, SimpleStmt, parse_args, parse_expression,
};

/// A parsed artifact.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Program {
    pub(crate) nodes: Vec<Node>,
    pub(crate) source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Echo(Expr),
    Run(Vec<SimpleStmt>),
    If {
        arms: Vec<(Expr, Vec<Node>)>,
        fallback: Option<Vec<Node>>,
    },
    Foreach {
        header: ForeachHeader,
        body: Vec<Node>,
        /// `forelse` empty branch.
        empty: Option<Vec<Node>>,
    },
    For {
        header: ForHeader,
        body: Vec<Node>,
    },
    While {
        cond: Expr,
        body: Vec<Node>,
    },
    Break {
        levels: i64,
        cond: Option<Expr>,
    },
    Continue {
        levels: i64,
        cond: Option<Expr>,
    },
    Section {
        name: Expr,
        body: Vec<Node>,
        end: SectionEnd,
    },
    InlineSection {
        name: Expr,
        value: Expr,
    },
    Yield {
        name: Expr,
        default: Option<Expr>,
    },
    /// `@parent` placeholder inside a section body.
    Parent,
    Include {
        view: Expr,
        data: Option<Expr>,
        /// `includeif`: silently skip a missing view.
        if_exists: bool,
    },
    IncludeWhen {
        cond: Expr,
        view: Expr,
        data: Option<Expr>,
        /// Inverted condition (`includeunless`).
        unless: bool,
    },
    IncludeFirst {
        views: Expr,
        data: Option<Expr>,
    },
    Each {
        view: Expr,
        items: Expr,
        var: Expr,
        empty: Option<Expr>,
    },
    Push {
        name: Expr,
        body: Vec<Node>,
        prepend: bool,
    },
    InlinePush {
        name: Expr,
        value: Expr,
        prepend: bool,
    },
    Stack {
        name: Expr,
    },
    Component {
        name: Expr,
        data: Option<Expr>,
        body: Vec<Node>,
    },
    Slot {
        name: Expr,
        body: Vec<Node>,
    },
    InlineSlot {
        name: Expr,
        value: Expr,
    },
    Lang {
        replace: Option<Expr>,
        body: Vec<Node>,
    },
    ErrorBlock {
        name: Expr,
        body: Vec<Node>,
    },
}

/// How a block section terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionEnd {
    /// `@endsection` / `@stop`: keep the first capture.
    Stop,
    /// `@overwrite`: replace any earlier capture.
    Overwrite,
    /// `@show`: stop and yield immediately.
    Show,
}

impl Program {
    pub(crate) fn parse(artifact: &str) -> Result<Program> {
        let mut source_path = None;
        let mut flat = Vec::new();
        for chunk in chunk(artifact)? {
            match chunk {
                Chunk::Path(path) => source_path = Some(PathBuf::from(path)),
                other => flat.push(other),
            }
        }

        let mut stream = flat.into_iter().peekable();
        let nodes = parse_nodes(&mut stream, &[])?;
        if let Some(stray) = stream.next() {
            return Err(Error::syntax(format!("unexpected `{}`", stray.describe())));
        }
        Ok(Program { nodes, source_path })
    }
}

// ===== chunking =====

#[derive(Debug)]
enum Chunk {
    Text(String),
    Tag { keyword: String, rest: String },
    Path(String),
}

impl Chunk {
    fn describe(&self) -> String {
        match self {
            Chunk::Text(_) => "text".to_string(),
            Chunk::Tag { keyword, .. } => keyword.clone(),
            Chunk::Path(_) => "path marker".to_string(),
        }
    }
}

fn chunk(artifact: &str) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    let mut rest = artifact;
    while let Some(at) = rest.find("<?view") {
        if at > 0 {
            chunks.push(Chunk::Text(rest[..at].to_string()));
        }
        let after = &rest[at + "<?view".len()..];
        let end = after
            .find("?>")
            .ok_or_else(|| Error::syntax("unterminated code tag"))?;
        let inner = after[..end].trim();
        rest = &after[end + 2..];

        if let Some(marker) = inner.strip_prefix("/**PATH") {
            let path = marker
                .strip_suffix("ENDPATH**/")
                .ok_or_else(|| Error::syntax("malformed path marker"))?;
            chunks.push(Chunk::Path(path.trim().to_string()));
            continue;
        }
        let (keyword, tag_rest) = match inner.find(char::is_whitespace) {
            Some(split) => (&inner[..split], inner[split..].trim_start()),
            None => (inner, ""),
        };
        if keyword.is_empty() {
            return Err(Error::syntax("empty code tag"));
        }
        chunks.push(Chunk::Tag {
            keyword: keyword.to_string(),
            rest: tag_rest.to_string(),
        });
    }
    if !rest.is_empty() {
        chunks.push(Chunk::Text(rest.to_string()));
    }
    Ok(chunks)
}

// ===== tree building =====

type Stream = std::iter::Peekable<std::vec::IntoIter<Chunk>>;

/// Parses nodes until one of `until` keywords appears (consumed; its keyword
/// is left readable through the return). With an empty `until`, parses to
/// end of stream.
fn parse_nodes(stream: &mut Stream, until: &[&str]) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    loop {
        let stop = matches!(
            stream.peek(),
            Some(Chunk::Tag { keyword, .. }) if until.contains(&keyword.as_str())
        );
        if stop {
            return Ok(nodes);
        }
        match stream.next() {
            None if until.is_empty() => return Ok(nodes),
            None => {
                return Err(Error::syntax(format!(
                    "unexpected end of template, expected one of {until:?}"
                )));
            }
            Some(Chunk::Text(text)) => nodes.push(Node::Text(text)),
            Some(Chunk::Path(_)) => {}
            Some(Chunk::Tag { keyword, rest }) => {
                nodes.push(parse_tag(stream, &keyword, &rest)?);
            }
        }
    }
}

/// Consumes the pending terminator tag, returning its keyword.
fn take_terminator(stream: &mut Stream) -> (String, String) {
    match stream.next() {
        Some(Chunk::Tag { keyword, rest }) => (keyword, rest),
        _ => unreachable!("caller peeked a terminator tag"),
    }
}

fn parse_tag(stream: &mut Stream, keyword: &str, rest: &str) -> Result<Node> {
    match keyword {
        "echo" => Ok(Node::Echo(parse_expression(rest)?)),
        "run" => Ok(Node::Run(expr::parse_statements(rest)?)),

        "if" => parse_if(stream, rest),

        "foreach" => {
            let header = expr::parse_foreach(rest)?;
            let body = parse_nodes(stream, &["endforeach"])?;
            take_terminator(stream);
            Ok(Node::Foreach {
                header,
                body,
                empty: None,
            })
        }
        "forelse" => {
            let header = expr::parse_foreach(rest)?;
            let body = parse_nodes(stream, &["forelseempty", "endforelse"])?;
            let (terminator, _) = take_terminator(stream);
            let empty = if terminator == "forelseempty" {
                let empty = parse_nodes(stream, &["endforelse"])?;
                take_terminator(stream);
                Some(empty)
            } else {
                Some(Vec::new())
            };
            Ok(Node::Foreach {
                header,
                body,
                empty,
            })
        }
        "for" => {
            let header: ForHeader = expr::parse_for(rest)?;
            let body = parse_nodes(stream, &["endfor"])?;
            take_terminator(stream);
            Ok(Node::For { header, body })
        }
        "while" => {
            let cond = parse_expression(rest)?;
            let body = parse_nodes(stream, &["endwhile"])?;
            take_terminator(stream);
            Ok(Node::While { cond, body })
        }
        "break" => parse_jump(rest, true),
        "continue" => parse_jump(rest, false),

        "section" => {
            let mut args = parse_args(rest)?;
            match args.len() {
                1 => {
                    let name = args.remove(0);
                    let body = parse_nodes(stream, &["endsection", "overwrite", "show"])?;
                    let (terminator, _) = take_terminator(stream);
                    let end = match terminator.as_str() {
                        "overwrite" => SectionEnd::Overwrite,
                        "show" => SectionEnd::Show,
                        _ => SectionEnd::Stop,
                    };
                    Ok(Node::Section { name, body, end })
                }
                2 => {
                    let value = args.remove(1);
                    Ok(Node::InlineSection {
                        name: args.remove(0),
                        value,
                    })
                }
                n => Err(Error::syntax(format!("section takes 1 or 2 arguments, got {n}"))),
            }
        }
        "yield" => {
            let mut args = parse_args(rest)?;
            match args.len() {
                1 => Ok(Node::Yield {
                    name: args.remove(0),
                    default: None,
                }),
                2 => {
                    let default = args.remove(1);
                    Ok(Node::Yield {
                        name: args.remove(0),
                        default: Some(default),
                    })
                }
                n => Err(Error::syntax(format!("yield takes 1 or 2 arguments, got {n}"))),
            }
        }
        "parent" => Ok(Node::Parent),

        "include" | "includeif" => {
            let (view, data) = view_and_data(rest, keyword)?;
            Ok(Node::Include {
                view,
                data,
                if_exists: keyword == "includeif",
            })
        }
        "includewhen" | "includeunless" => {
            let mut args = parse_args(rest)?;
            if args.len() < 2 || args.len() > 3 {
                return Err(Error::syntax(format!(
                    "{keyword} takes 2 or 3 arguments, got {}",
                    args.len()
                )));
            }
            let data = (args.len() == 3).then(|| args.remove(2));
            let view = args.remove(1);
            Ok(Node::IncludeWhen {
                cond: args.remove(0),
                view,
                data,
                unless: keyword == "includeunless",
            })
        }
        "includefirst" => {
            let (views, data) = view_and_data(rest, keyword)?;
            Ok(Node::IncludeFirst { views, data })
        }
        "each" => {
            let mut args = parse_args(rest)?;
            if args.len() < 3 || args.len() > 4 {
                return Err(Error::syntax(format!(
                    "each takes 3 or 4 arguments, got {}",
                    args.len()
                )));
            }
            let empty = (args.len() == 4).then(|| args.remove(3));
            let var = args.remove(2);
            let items = args.remove(1);
            Ok(Node::Each {
                view: args.remove(0),
                items,
                var,
                empty,
            })
        }

        "push" | "prepend" => {
            let prepend = keyword == "prepend";
            let mut args = parse_args(rest)?;
            match args.len() {
                1 => {
                    let name = args.remove(0);
                    let body = parse_nodes(stream, &["endpush"])?;
                    take_terminator(stream);
                    Ok(Node::Push {
                        name,
                        body,
                        prepend,
                    })
                }
                2 => {
                    let value = args.remove(1);
                    Ok(Node::InlinePush {
                        name: args.remove(0),
                        value,
                        prepend,
                    })
                }
                n => Err(Error::syntax(format!(
                    "{keyword} takes 1 or 2 arguments, got {n}"
                ))),
            }
        }
        "stack" => Ok(Node::Stack {
            name: parse_expression(rest)?,
        }),

        "component" => {
            let (name, data) = view_and_data(rest, keyword)?;
            let body = parse_nodes(stream, &["endcomponent"])?;
            take_terminator(stream);
            Ok(Node::Component {
                name,
                data: Some(data.unwrap_or(Expr::Array(Vec::new()))),
                body,
            })
        }
        "slot" => {
            let mut args = parse_args(rest)?;
            match args.len() {
                1 => {
                    let name = args.remove(0);
                    let body = parse_nodes(stream, &["endslot"])?;
                    take_terminator(stream);
                    Ok(Node::Slot { name, body })
                }
                2 => {
                    let value = args.remove(1);
                    Ok(Node::InlineSlot {
                        name: args.remove(0),
                        value,
                    })
                }
                n => Err(Error::syntax(format!("slot takes 1 or 2 arguments, got {n}"))),
            }
        }

        "lang" => {
            let replace = if rest.is_empty() {
                None
            } else {
                Some(parse_expression(rest)?)
            };
            let body = parse_nodes(stream, &["endlang"])?;
            take_terminator(stream);
            Ok(Node::Lang { replace, body })
        }

        "error" => {
            let name = parse_expression(rest)?;
            let body = parse_nodes(stream, &["enderror"])?;
            take_terminator(stream);
            Ok(Node::ErrorBlock { name, body })
        }

        other => Err(Error::syntax(format!("unknown code tag `{other}`"))),
    }
}

fn parse_if(stream: &mut Stream, rest: &str) -> Result<Node> {
    let mut arms = vec![(
        parse_expression(rest)?,
        parse_nodes(stream, &["elseif", "else", "endif"])?,
    )];
    loop {
        let (terminator, rest) = take_terminator(stream);
        match terminator.as_str() {
            "elseif" => {
                let cond = parse_expression(&rest)?;
                let body = parse_nodes(stream, &["elseif", "else", "endif"])?;
                arms.push((cond, body));
            }
            "else" => {
                let fallback = parse_nodes(stream, &["endif"])?;
                take_terminator(stream);
                return Ok(Node::If {
                    arms,
                    fallback: Some(fallback),
                });
            }
            _ => {
                return Ok(Node::If {
                    arms,
                    fallback: None,
                });
            }
        }
    }
}

/// `break` / `continue`: bare, numeric level, or guarding condition.
fn parse_jump(rest: &str, is_break: bool) -> Result<Node> {
    let (levels, cond) = if rest.is_empty() {
        (1, None)
    } else {
        match parse_expression(rest)? {
            Expr::Int(n) if n >= 1 => (n, None),
            cond => (1, Some(cond)),
        }
    };
    Ok(if is_break {
        Node::Break { levels, cond }
    } else {
        Node::Continue { levels, cond }
    })
}

/// `(name)` or `(name, data)` argument shapes.
fn view_and_data(rest: &str, keyword: &str) -> Result<(Expr, Option<Expr>)> {
    let mut args = parse_args(rest)?;
    match args.len() {
        1 => Ok((args.remove(0), None)),
        2 => {
            let data = args.remove(1);
            Ok((args.remove(0), Some(data)))
        }
        n => Err(Error::syntax(format!(
            "{keyword} takes 1 or 2 arguments, got {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(artifact: &str) -> Program {
        Program::parse(artifact).unwrap()
    }

    #[test]
    fn text_and_echo() {
        let program = parse("a<?view echo $x ?>b");
        assert_eq!(
            program.nodes,
            vec![
                Node::Text("a".into()),
                Node::Echo(Expr::Var("x".into())),
                Node::Text("b".into()),
            ]
        );
    }

    #[test]
    fn path_marker_is_lifted() {
        let program = parse("hi<?view /**PATH views/a.blade.html ENDPATH**/ ?>");
        assert_eq!(program.nodes, vec![Node::Text("hi".into())]);
        assert_eq!(
            program.source_path,
            Some(PathBuf::from("views/a.blade.html"))
        );
    }

    #[test]
    fn if_elseif_else_nesting() {
        let program = parse(
            "<?view if $a ?>A<?view elseif $b ?>B<?view else ?>C<?view endif ?>",
        );
        let Node::If { arms, fallback } = &program.nodes[0] else {
            panic!("expected if, got {:?}", program.nodes);
        };
        assert_eq!(arms.len(), 2);
        assert_eq!(fallback.as_deref(), Some(&[Node::Text("C".into())][..]));
    }

    #[test]
    fn forelse_splits_on_empty_marker() {
        let program = parse(
            "<?view forelse $xs as $x ?>i<?view forelseempty ?>none<?view endforelse ?>",
        );
        let Node::Foreach { empty, .. } = &program.nodes[0] else {
            panic!("expected foreach");
        };
        assert_eq!(empty.as_deref(), Some(&[Node::Text("none".into())][..]));
    }

    #[test]
    fn numeric_break_levels() {
        let program = parse("<?view foreach $xs as $x ?><?view break 2 ?><?view endforeach ?>");
        let Node::Foreach { body, .. } = &program.nodes[0] else {
            panic!("expected foreach");
        };
        assert_eq!(body[0], Node::Break {
            levels: 2,
            cond: None
        });
    }

    #[test]
    fn conditional_continue() {
        let program =
            parse("<?view while $go ?><?view continue $skip ?><?view endwhile ?>");
        let Node::While { body, .. } = &program.nodes[0] else {
            panic!("expected while");
        };
        assert!(matches!(&body[0], Node::Continue { levels: 1, cond: Some(_) }));
    }

    #[test]
    fn section_terminators() {
        let show = parse("<?view section 'a' ?>x<?view show ?>");
        assert!(matches!(
            &show.nodes[0],
            Node::Section { end: SectionEnd::Show, .. }
        ));
        let inline = parse("<?view section 'a', 'v' ?>");
        assert!(matches!(&inline.nodes[0], Node::InlineSection { .. }));
    }

    #[test]
    fn unclosed_block_is_a_syntax_error() {
        assert!(Program::parse("<?view if $a ?>x").is_err());
        assert!(Program::parse("<?view section 'a' ?>x").is_err());
    }

    #[test]
    fn unknown_tag_is_a_syntax_error() {
        assert!(Program::parse("<?view bogus ?>").is_err());
    }
}
