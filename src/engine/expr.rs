//! Expression language used inside `<?view ... ?>` tags.
//!
//! A small PHP-flavored surface: `$variables`, `'strings'`, numbers,
//! `['key' => value]` arrays, `->member` and `[index]` access, `.`
//! concatenation, the usual comparison and boolean operators, `??`, the
//! ternary (including the `?:` elvis form) and builtin calls such as
//! `esc(..)` or `trans(..)`. Parsed by a hand lexer plus a recursive-descent
//! parser; evaluation lives in [`super::eval`].

use crate::error::{Error, Result};

// ===== AST =====

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Var(String),
    /// `[a, 'k' => b]`; entries without a key append.
    Array(Vec<(Option<Expr>, Expr)>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `cond ? then : else`; a missing `then` is the elvis form.
    Ternary(Box<Expr>, Option<Box<Expr>>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Coalesce,
    Eq,
    Ne,
    Same,
    NotSame,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
}

/// A statement allowed in `run` blocks and `for` headers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SimpleStmt {
    Assign { target: Expr, value: Expr },
    AddAssign { target: Expr, value: Expr },
    SubAssign { target: Expr, value: Expr },
    Incr { target: Expr },
    Decr { target: Expr },
    Expr(Expr),
}

/// Parsed `foreach` header: `subject as [$key =>] $value`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ForeachHeader {
    pub(crate) subject: Expr,
    pub(crate) key: Option<String>,
    pub(crate) value: String,
}

/// Parsed `for` header: `init; cond; step`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ForHeader {
    pub(crate) init: Vec<SimpleStmt>,
    pub(crate) cond: Option<Expr>,
    pub(crate) step: Vec<SimpleStmt>,
}

// ===== entry points =====

pub(crate) fn parse_expression(src: &str) -> Result<Expr> {
    let mut parser = Parser::new(src)?;
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parses a top-level comma-separated argument list.
pub(crate) fn parse_args(src: &str) -> Result<Vec<Expr>> {
    let mut parser = Parser::new(src)?;
    let mut args = Vec::new();
    if !parser.at_end() {
        args.push(parser.expression()?);
        while parser.eat(&Token::Comma) {
            args.push(parser.expression()?);
        }
    }
    parser.expect_end()?;
    Ok(args)
}

pub(crate) fn parse_foreach(src: &str) -> Result<ForeachHeader> {
    let mut parser = Parser::new(src)?;
    let subject = parser.expression()?;
    match parser.next() {
        Some(Token::Ident(kw)) if kw == "as" => {}
        _ => return Err(Error::syntax(format!("expected `as` in foreach: {src}"))),
    }
    let first = parser.expect_var()?;
    let header = if parser.eat(&Token::FatArrow) {
        ForeachHeader {
            subject,
            key: Some(first),
            value: parser.expect_var()?,
        }
    } else {
        ForeachHeader {
            subject,
            key: None,
            value: first,
        }
    };
    parser.expect_end()?;
    Ok(header)
}

pub(crate) fn parse_for(src: &str) -> Result<ForHeader> {
    let mut parser = Parser::new(src)?;
    let init = parser.statement_list(true)?;
    parser.expect_semi()?;
    let cond = if parser.check(&Token::Semi) {
        None
    } else {
        Some(parser.expression()?)
    };
    parser.expect_semi()?;
    let step = parser.statement_list(false)?;
    parser.expect_end()?;
    Ok(ForHeader { init, cond, step })
}

/// Parses a `run` block: semicolon-separated simple statements.
pub(crate) fn parse_statements(src: &str) -> Result<Vec<SimpleStmt>> {
    let mut parser = Parser::new(src)?;
    let mut stmts = Vec::new();
    loop {
        while parser.eat(&Token::Semi) {}
        if parser.at_end() {
            return Ok(stmts);
        }
        stmts.push(parser.simple_stmt()?);
        if !parser.at_end() {
            parser.expect_semi()?;
        }
    }
}

// ===== lexer =====

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Var(String),
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Arrow,
    FatArrow,
    Dot,
    Question,
    Colon,
    OrOr,
    AndAnd,
    Not,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Coalesce,
    Assign,
    PlusAssign,
    MinusAssign,
    PlusPlus,
    MinusMinus,
    Semi,
}

fn lex(src: &str) -> Result<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        match b {
            b if b.is_ascii_whitespace() => pos += 1,
            b'$' => {
                let len = ident_len(&src[pos + 1..]);
                if len == 0 {
                    return Err(Error::syntax(format!("dangling `$` in `{src}`")));
                }
                tokens.push(Token::Var(src[pos + 1..pos + 1 + len].to_string()));
                pos += 1 + len;
            }
            b'\'' | b'"' => {
                let (text, len) = lex_string(&src[pos..], b)?;
                tokens.push(Token::Str(text));
                pos += len;
            }
            b'0'..=b'9' => {
                let (token, len) = lex_number(&src[pos..]);
                tokens.push(token);
                pos += len;
            }
            b'(' => two(&mut tokens, &mut pos, Token::LParen, 1),
            b')' => two(&mut tokens, &mut pos, Token::RParen, 1),
            b'[' => two(&mut tokens, &mut pos, Token::LBracket, 1),
            b']' => two(&mut tokens, &mut pos, Token::RBracket, 1),
            b',' => two(&mut tokens, &mut pos, Token::Comma, 1),
            b';' => two(&mut tokens, &mut pos, Token::Semi, 1),
            b'.' => two(&mut tokens, &mut pos, Token::Dot, 1),
            b'%' => two(&mut tokens, &mut pos, Token::Percent, 1),
            b'*' => two(&mut tokens, &mut pos, Token::Star, 1),
            b'/' => two(&mut tokens, &mut pos, Token::Slash, 1),
            b'?' => {
                if src[pos..].starts_with("??") {
                    two(&mut tokens, &mut pos, Token::Coalesce, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Question, 1);
                }
            }
            b':' => two(&mut tokens, &mut pos, Token::Colon, 1),
            b'|' if src[pos..].starts_with("||") => two(&mut tokens, &mut pos, Token::OrOr, 2),
            b'&' if src[pos..].starts_with("&&") => two(&mut tokens, &mut pos, Token::AndAnd, 2),
            b'=' => {
                if src[pos..].starts_with("===") {
                    two(&mut tokens, &mut pos, Token::EqEqEq, 3);
                } else if src[pos..].starts_with("==") {
                    two(&mut tokens, &mut pos, Token::EqEq, 2);
                } else if src[pos..].starts_with("=>") {
                    two(&mut tokens, &mut pos, Token::FatArrow, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Assign, 1);
                }
            }
            b'!' => {
                if src[pos..].starts_with("!==") {
                    two(&mut tokens, &mut pos, Token::NotEqEq, 3);
                } else if src[pos..].starts_with("!=") {
                    two(&mut tokens, &mut pos, Token::NotEq, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Not, 1);
                }
            }
            b'<' => {
                if src[pos..].starts_with("<=") {
                    two(&mut tokens, &mut pos, Token::Le, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Lt, 1);
                }
            }
            b'>' => {
                if src[pos..].starts_with(">=") {
                    two(&mut tokens, &mut pos, Token::Ge, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Gt, 1);
                }
            }
            b'+' => {
                if src[pos..].starts_with("++") {
                    two(&mut tokens, &mut pos, Token::PlusPlus, 2);
                } else if src[pos..].starts_with("+=") {
                    two(&mut tokens, &mut pos, Token::PlusAssign, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Plus, 1);
                }
            }
            b'-' => {
                if src[pos..].starts_with("--") {
                    two(&mut tokens, &mut pos, Token::MinusMinus, 2);
                } else if src[pos..].starts_with("-=") {
                    two(&mut tokens, &mut pos, Token::MinusAssign, 2);
                } else if src[pos..].starts_with("->") {
                    two(&mut tokens, &mut pos, Token::Arrow, 2);
                } else {
                    two(&mut tokens, &mut pos, Token::Minus, 1);
                }
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let len = ident_len(&src[pos..]);
                tokens.push(Token::Ident(src[pos..pos + len].to_string()));
                pos += len;
            }
            other => {
                return Err(Error::syntax(format!(
                    "unexpected character `{}` in `{src}`",
                    other as char
                )));
            }
        }
    }
    Ok(tokens)
}

fn two(tokens: &mut Vec<Token>, pos: &mut usize, token: Token, len: usize) {
    tokens.push(token);
    *pos += len;
}

fn ident_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count()
}

fn lex_string(s: &str, quote: u8) -> Result<(String, usize)> {
    let bytes = s.as_bytes();
    let mut out = String::new();
    let mut pos = 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' if pos + 1 < bytes.len() => {
                let escaped = bytes[pos + 1];
                let ch = match escaped {
                    b'n' if quote == b'"' => '\n',
                    b't' if quote == b'"' => '\t',
                    b'\\' => '\\',
                    other if other == quote => quote as char,
                    other => {
                        // Unknown escapes keep the backslash, as PHP does.
                        out.push('\\');
                        other as char
                    }
                };
                out.push(ch);
                pos += 2;
            }
            b if b == quote => return Ok((out, pos + 1)),
            _ => {
                let ch = s[pos..].chars().next().unwrap_or('\u{fffd}');
                out.push(ch);
                pos += ch.len_utf8();
            }
        }
    }
    Err(Error::syntax(format!("unterminated string in `{s}`")))
}

fn lex_number(s: &str) -> (Token, usize) {
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    let rest = &s[int_len..];
    let frac_len = rest
        .strip_prefix('.')
        .map(|r| r.bytes().take_while(u8::is_ascii_digit).count())
        .filter(|len| *len > 0);
    match frac_len {
        Some(frac) => {
            let len = int_len + 1 + frac;
            (Token::Float(s[..len].parse().unwrap_or(0.0)), len)
        }
        None => (Token::Int(s[..int_len].parse().unwrap_or(0)), int_len),
    }
}

// ===== parser =====

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Parser> {
        Ok(Parser {
            tokens: lex(src)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(Error::syntax(format!(
                "expected {token:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn expect_semi(&mut self) -> Result<()> {
        self.expect(&Token::Semi)
    }

    fn expect_end(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(Error::syntax(format!(
                "unexpected trailing {:?}",
                self.peek()
            )))
        }
    }

    fn expect_var(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Var(name)) => Ok(name),
            other => Err(Error::syntax(format!("expected variable, found {other:?}"))),
        }
    }

    // expression := ternary
    fn expression(&mut self) -> Result<Expr> {
        let cond = self.coalesce()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = if self.check(&Token::Colon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.expect(&Token::Colon)?;
        let fallback = self.expression()?;
        Ok(Expr::Ternary(Box::new(cond), then, Box::new(fallback)))
    }

    fn coalesce(&mut self) -> Result<Expr> {
        let mut left = self.or()?;
        while self.eat(&Token::Coalesce) {
            let right = self.or()?;
            left = Expr::Binary(BinaryOp::Coalesce, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while self.eat(&Token::OrOr) {
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;
        while self.eat(&Token::AndAnd) {
            let right = self.equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                Some(Token::EqEqEq) => BinaryOp::Same,
                Some(Token::NotEqEq) => BinaryOp::NotSame,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.comparison()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                Some(Token::Dot) => BinaryOp::Concat,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Arrow) {
                match self.next() {
                    Some(Token::Ident(name)) => expr = Expr::Member(Box::new(expr), name),
                    other => {
                        return Err(Error::syntax(format!(
                            "expected member name after ->, found {other:?}"
                        )));
                    }
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Var(name)) => Ok(Expr::Var(name)),
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::Float(f)) => Ok(Expr::Float(f)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => self.array_literal(),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                _ if self.check(&Token::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if !self.check(&Token::RParen) {
                        args.push(self.expression()?);
                        while self.eat(&Token::Comma) {
                            args.push(self.expression()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                }
                _ => Err(Error::syntax(format!("unexpected identifier `{name}`"))),
            },
            other => Err(Error::syntax(format!("unexpected token {other:?}"))),
        }
    }

    fn array_literal(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(Expr::Array(entries));
        }
        loop {
            let first = self.expression()?;
            if self.eat(&Token::FatArrow) {
                let value = self.expression()?;
                entries.push((Some(first), value));
            } else {
                entries.push((None, first));
            }
            if !self.eat(&Token::Comma) {
                break;
            }
            // Trailing comma.
            if self.check(&Token::RBracket) {
                break;
            }
        }
        self.expect(&Token::RBracket)?;
        Ok(Expr::Array(entries))
    }

    // ===== simple statements =====

    fn statement_list(&mut self, stop_at_semi: bool) -> Result<Vec<SimpleStmt>> {
        let mut stmts = Vec::new();
        if self.at_end() || (stop_at_semi && self.check(&Token::Semi)) {
            return Ok(stmts);
        }
        stmts.push(self.simple_stmt()?);
        while self.eat(&Token::Comma) {
            stmts.push(self.simple_stmt()?);
        }
        Ok(stmts)
    }

    fn simple_stmt(&mut self) -> Result<SimpleStmt> {
        let target = self.postfix()?;
        let stmt = match self.peek() {
            Some(Token::Assign) => {
                self.pos += 1;
                SimpleStmt::Assign {
                    target,
                    value: self.expression()?,
                }
            }
            Some(Token::PlusAssign) => {
                self.pos += 1;
                SimpleStmt::AddAssign {
                    target,
                    value: self.expression()?,
                }
            }
            Some(Token::MinusAssign) => {
                self.pos += 1;
                SimpleStmt::SubAssign {
                    target,
                    value: self.expression()?,
                }
            }
            Some(Token::PlusPlus) => {
                self.pos += 1;
                SimpleStmt::Incr { target }
            }
            Some(Token::MinusMinus) => {
                self.pos += 1;
                SimpleStmt::Decr { target }
            }
            _ => SimpleStmt::Expr(target),
        };
        Ok(stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_members_and_indexing() {
        let expr = parse_expression("$user->name['first']").unwrap();
        assert_eq!(
            expr,
            Expr::Index(
                Box::new(Expr::Member(
                    Box::new(Expr::Var("user".into())),
                    "name".into()
                )),
                Box::new(Expr::Str("first".into()))
            )
        );
    }

    #[test]
    fn operator_precedence() {
        // `.` binds tighter than `==`, which binds tighter than `&&`.
        let expr = parse_expression("$a . 'x' == $b && $c").unwrap();
        let concat = Expr::Binary(
            BinaryOp::Concat,
            Box::new(Expr::Var("a".into())),
            Box::new(Expr::Str("x".into())),
        );
        let eq = Expr::Binary(BinaryOp::Eq, Box::new(concat), Box::new(Expr::Var("b".into())));
        assert_eq!(
            expr,
            Expr::Binary(BinaryOp::And, Box::new(eq), Box::new(Expr::Var("c".into())))
        );
    }

    #[test]
    fn ternary_and_elvis() {
        assert_eq!(
            parse_expression("$a ?: 'x'").unwrap(),
            Expr::Ternary(
                Box::new(Expr::Var("a".into())),
                None,
                Box::new(Expr::Str("x".into()))
            )
        );
        assert!(matches!(
            parse_expression("$a ? 1 : 2").unwrap(),
            Expr::Ternary(_, Some(_), _)
        ));
    }

    #[test]
    fn array_literals_with_mixed_keys() {
        let expr = parse_expression("['a' => 1, 2,]").unwrap();
        assert_eq!(
            expr,
            Expr::Array(vec![
                (Some(Expr::Str("a".into())), Expr::Int(1)),
                (None, Expr::Int(2)),
            ])
        );
    }

    #[test]
    fn call_arguments() {
        assert_eq!(
            parse_args("'greeting', ['name' => $name]").unwrap().len(),
            2
        );
        assert_eq!(parse_args("").unwrap(), vec![]);
    }

    #[test]
    fn foreach_headers() {
        let header = parse_foreach("$items as $item").unwrap();
        assert_eq!(header.key, None);
        assert_eq!(header.value, "item");

        let header = parse_foreach("$map as $k => $v").unwrap();
        assert_eq!(header.key.as_deref(), Some("k"));
        assert_eq!(header.value, "v");
    }

    #[test]
    fn for_header() {
        let header = parse_for("$i = 0; $i < 10; $i++").unwrap();
        assert_eq!(header.init.len(), 1);
        assert!(header.cond.is_some());
        assert_eq!(
            header.step,
            vec![SimpleStmt::Incr {
                target: Expr::Var("i".into())
            }]
        );
    }

    #[test]
    fn run_statements() {
        let stmts = parse_statements("$x = 1; $x += 2;").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            parse_expression(r"'it\'s'").unwrap(),
            Expr::Str("it's".into())
        );
        assert_eq!(
            parse_expression(r#""a\nb""#).unwrap(),
            Expr::Str("a\nb".into())
        );
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        assert!(parse_expression("'oops").is_err());
    }
}
