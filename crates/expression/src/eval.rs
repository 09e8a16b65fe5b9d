//! A small expression language: literals, `$root.path` references, unary
//! and binary operators, and parenthesized grouping.
//!
//! This is the concrete evaluator behind the otherwise-opaque template
//! boundary — higher layers only ever call [`crate::engine::ExpressionEngine`];
//! nothing outside this crate depends on this grammar.

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::{ExpressionError, ExpressionResult};
use crate::value::{is_truthy, value_type_name};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Dollar,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Op(&'static str),
    Eof,
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> ExpressionResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            match c {
                '$' => {
                    self.chars.next();
                    tokens.push(Token::Dollar);
                }
                '.' => {
                    self.chars.next();
                    tokens.push(Token::Dot);
                }
                '[' => {
                    self.chars.next();
                    tokens.push(Token::LBracket);
                }
                ']' => {
                    self.chars.next();
                    tokens.push(Token::RBracket);
                }
                '(' => {
                    self.chars.next();
                    tokens.push(Token::LParen);
                }
                ')' => {
                    self.chars.next();
                    tokens.push(Token::RParen);
                }
                '\'' | '"' => {
                    tokens.push(Token::Str(self.read_string(c)?));
                }
                '0'..='9' => tokens.push(Token::Number(self.read_number())),
                c if c.is_alphabetic() || c == '_' => tokens.push(Token::Ident(self.read_ident())),
                '=' | '!' | '<' | '>' | '&' | '|' | '+' | '-' | '*' | '/' => {
                    tokens.push(self.read_op(i)?);
                }
                other => {
                    return Err(ExpressionError::parse(
                        self.src,
                        format!("unexpected character `{other}` at offset {i}"),
                    ));
                }
            }
        }
        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn read_string(&mut self, quote: char) -> ExpressionResult<String> {
        self.chars.next(); // consume opening quote
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, '\\')) => {
                    if let Some((_, escaped)) = self.chars.next() {
                        out.push(escaped);
                    }
                }
                Some((_, c)) => out.push(c),
                None => {
                    return Err(ExpressionError::parse(self.src, "unterminated string literal"));
                }
            }
        }
    }

    fn read_number(&mut self) -> f64 {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out.parse().unwrap_or(0.0)
    }

    fn read_ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn read_op(&mut self, offset: usize) -> ExpressionResult<Token> {
        let (_, c) = self.chars.next().unwrap();
        let two: Option<char> = self.chars.peek().map(|&(_, c)| c);
        let op = match (c, two) {
            ('=', Some('=')) => {
                self.chars.next();
                "=="
            }
            ('!', Some('=')) => {
                self.chars.next();
                "!="
            }
            ('<', Some('=')) => {
                self.chars.next();
                "<="
            }
            ('>', Some('=')) => {
                self.chars.next();
                ">="
            }
            ('&', Some('&')) => {
                self.chars.next();
                "&&"
            }
            ('|', Some('|')) => {
                self.chars.next();
                "||"
            }
            ('!', _) => "!",
            ('<', _) => "<",
            ('>', _) => ">",
            ('+', _) => "+",
            ('-', _) => "-",
            ('*', _) => "*",
            ('/', _) => "/",
            _ => {
                return Err(ExpressionError::parse(
                    self.src,
                    format!("unexpected operator at offset {offset}"),
                ));
            }
        };
        Ok(Token::Op(op))
    }
}

/// Parsed expression AST. Kept private — callers only ever get a [`Value`]
/// back from [`evaluate`].
#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Path(Vec<PathSegment>),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone)]
enum PathSegment {
    Field(String),
    Index(i64),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
}

impl Parser {
    fn new(tokens: Vec<Token>, source: &str) -> Self {
        Self {
            tokens,
            pos: 0,
            source: source.to_owned(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn err(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::parse(&self.source, message)
    }

    fn parse_expression(&mut self) -> ExpressionResult<Expr> {
        let expr = self.parse_or()?;
        if *self.peek() != Token::Eof {
            return Err(self.err(format!("unexpected trailing token {:?}", self.peek())));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Token::Op("||")) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary("||", Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_comparison()?;
        while matches!(self.peek(), Token::Op("&&")) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary("&&", Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Op(op @ ("==" | "!=" | "<" | "<=" | ">" | ">=")) => *op,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Op(op @ ("+" | "-")) => *op,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ExpressionResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Op(op @ ("*" | "/")) => *op,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ExpressionResult<Expr> {
        match self.peek() {
            Token::Op("!") => {
                self.advance();
                Ok(Expr::Unary("!", Box::new(self.parse_unary()?)))
            }
            Token::Op("-") => {
                self.advance();
                Ok(Expr::Unary("-", Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ExpressionResult<Expr> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(serde_json::json!(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Ident(ref id) if id == "true" => Ok(Expr::Literal(Value::Bool(true))),
            Token::Ident(ref id) if id == "false" => Ok(Expr::Literal(Value::Bool(false))),
            Token::Ident(ref id) if id == "null" => Ok(Expr::Literal(Value::Null)),
            Token::Dollar => self.parse_path(),
            Token::LParen => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Token::RParen => Ok(inner),
                    other => Err(self.err(format!("expected `)`, found {other:?}"))),
                }
            }
            other => Err(self.err(format!("unexpected token {other:?}"))),
        }
    }

    fn parse_path(&mut self) -> ExpressionResult<Expr> {
        let root = match self.advance() {
            Token::Ident(id) => id,
            other => return Err(self.err(format!("expected root identifier after `$`, found {other:?}"))),
        };
        let mut segments = vec![PathSegment::Field(root)];
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    match self.advance() {
                        Token::Ident(id) => segments.push(PathSegment::Field(id)),
                        other => return Err(self.err(format!("expected field name after `.`, found {other:?}"))),
                    }
                }
                Token::LBracket => {
                    self.advance();
                    match self.advance() {
                        Token::Number(n) => segments.push(PathSegment::Index(n as i64)),
                        Token::Str(s) => segments.push(PathSegment::Field(s)),
                        other => return Err(self.err(format!("expected index or key in `[...]`, found {other:?}"))),
                    }
                    match self.advance() {
                        Token::RBracket => {}
                        other => return Err(self.err(format!("expected `]`, found {other:?}"))),
                    }
                }
                _ => break,
            }
        }
        Ok(Expr::Path(segments))
    }
}

fn navigate(root_ctx: &EvaluationContext, segments: &[PathSegment], source: &str) -> ExpressionResult<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(ExpressionError::eval(source, "empty path"));
    };
    let PathSegment::Field(root_name) = first else {
        return Err(ExpressionError::eval(source, "path must start with a field name"));
    };
    let mut current = root_ctx
        .resolve_root(root_name)
        .ok_or_else(|| ExpressionError::eval(source, format!("unknown root `${root_name}`")))?;
    for seg in rest {
        current = match seg {
            PathSegment::Field(name) => match &current {
                Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
                Value::Null => Value::Null,
                other => {
                    return Err(ExpressionError::eval(
                        source,
                        format!("cannot access field `{name}` on {}", value_type_name(other)),
                    ));
                }
            },
            PathSegment::Index(idx) => match &current {
                Value::Array(items) => {
                    let len = items.len() as i64;
                    let real = if *idx < 0 { idx + len } else { *idx };
                    if real < 0 || real >= len {
                        Value::Null
                    } else {
                        items[real as usize].clone()
                    }
                }
                Value::Null => Value::Null,
                other => {
                    return Err(ExpressionError::eval(
                        source,
                        format!("cannot index into {}", value_type_name(other)),
                    ));
                }
            },
        };
    }
    Ok(current)
}

fn eval_expr(expr: &Expr, ctx: &EvaluationContext, source: &str) -> ExpressionResult<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Path(segments) => navigate(ctx, segments, source),
        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, ctx, source)?;
            match *op {
                "!" => Ok(Value::Bool(!is_truthy(&v))),
                "-" => match v.as_f64() {
                    Some(n) => Ok(serde_json::json!(-n)),
                    None => Err(ExpressionError::eval(source, "unary `-` requires a number")),
                },
                _ => unreachable!(),
            }
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(op, lhs, rhs, ctx, source),
    }
}

fn eval_binary(
    op: &str,
    lhs: &Expr,
    rhs: &Expr,
    ctx: &EvaluationContext,
    source: &str,
) -> ExpressionResult<Value> {
    match op {
        "&&" => {
            let l = eval_expr(lhs, ctx, source)?;
            if !is_truthy(&l) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(is_truthy(&eval_expr(rhs, ctx, source)?)))
        }
        "||" => {
            let l = eval_expr(lhs, ctx, source)?;
            if is_truthy(&l) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(is_truthy(&eval_expr(rhs, ctx, source)?)))
        }
        "==" => Ok(Value::Bool(eval_expr(lhs, ctx, source)? == eval_expr(rhs, ctx, source)?)),
        "!=" => Ok(Value::Bool(eval_expr(lhs, ctx, source)? != eval_expr(rhs, ctx, source)?)),
        "<" | "<=" | ">" | ">=" => {
            let l = eval_expr(lhs, ctx, source)?;
            let r = eval_expr(rhs, ctx, source)?;
            let (ln, rn) = numeric_pair(&l, &r, source)?;
            let result = match op {
                "<" => ln < rn,
                "<=" => ln <= rn,
                ">" => ln > rn,
                ">=" => ln >= rn,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        "+" => {
            let l = eval_expr(lhs, ctx, source)?;
            let r = eval_expr(rhs, ctx, source)?;
            match (&l, &r) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
                _ => {
                    let (ln, rn) = numeric_pair(&l, &r, source)?;
                    Ok(serde_json::json!(ln + rn))
                }
            }
        }
        "-" | "*" | "/" => {
            let l = eval_expr(lhs, ctx, source)?;
            let r = eval_expr(rhs, ctx, source)?;
            let (ln, rn) = numeric_pair(&l, &r, source)?;
            let result = match op {
                "-" => ln - rn,
                "*" => ln * rn,
                "/" => {
                    if rn == 0.0 {
                        return Err(ExpressionError::eval(source, "division by zero"));
                    }
                    ln / rn
                }
                _ => unreachable!(),
            };
            Ok(serde_json::json!(result))
        }
        _ => unreachable!(),
    }
}

fn numeric_pair(l: &Value, r: &Value, source: &str) -> ExpressionResult<(f64, f64)> {
    let ln = l
        .as_f64()
        .ok_or_else(|| ExpressionError::eval(source, format!("expected a number, got {}", value_type_name(l))))?;
    let rn = r
        .as_f64()
        .ok_or_else(|| ExpressionError::eval(source, format!("expected a number, got {}", value_type_name(r))))?;
    Ok((ln, rn))
}

/// Parse and evaluate `source` (without surrounding `{{ }}`) against `ctx`.
pub(crate) fn evaluate(source: &str, ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens, source);
    let expr = parser.parse_expression()?;
    eval_expr(&expr, ctx, source)
}
