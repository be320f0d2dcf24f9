// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Row filter expressions such as `price > 100 and side == "BUY"`.
//!
//! Identifiers name columns. A cell binds as a number when it parses as
//! `f64`, otherwise as text.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    UnexpectedChar { position: usize, found: char },
    UnterminatedString { position: usize },
    UnexpectedToken { position: usize, found: String },
    UnexpectedEnd,
    UnknownIdentifier(String),
    TypeMismatch { op: &'static str },
    DivisionByZero,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar { position, found } => {
                write!(f, "unexpected character {found:?} at {position}")
            }
            Self::UnterminatedString { position } => {
                write!(f, "unterminated string starting at {position}")
            }
            Self::UnexpectedToken { position, found } => {
                write!(f, "unexpected {found} at {position}")
            }
            Self::UnexpectedEnd => f.write_str("unexpected end of expression"),
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier {name}"),
            Self::TypeMismatch { op } => write!(f, "operands of {op} have incompatible types"),
            Self::DivisionByZero => f.write_str("division by zero"),
        }
    }
}

impl std::error::Error for ExprError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn from_cell(cell: &str) -> Self {
        match cell.parse::<f64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(cell.to_owned()),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Bool(_) => "bool",
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(number) => Some(number.to_string()),
            Self::Bool(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Column(String),
    Not(Box<Expr>),
    Negate(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Variable lookup used during evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
}

/// Binds a table header to one normalized row.
#[derive(Debug, Clone, Copy)]
pub struct RowScope<'a> {
    pub header: &'a [String],
    pub row: &'a [String],
}

impl Scope for RowScope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        let index = self.header.iter().position(|column| column == name)?;
        self.row.get(index).map(|cell| Value::from_cell(cell))
    }
}

impl Expr {
    pub fn parse(source: &str) -> Result<Expr, ExprError> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser { tokens, current: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(token.unexpected()),
        }
    }

    pub fn eval(&self, scope: &dyn Scope) -> Result<Value, ExprError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Column(name) => scope
                .lookup(name)
                .ok_or_else(|| ExprError::UnknownIdentifier(name.clone())),
            Self::Not(inner) => match inner.eval(scope)? {
                Value::Bool(value) => Ok(Value::Bool(!value)),
                _ => Err(ExprError::TypeMismatch { op: "not" }),
            },
            Self::Negate(inner) => match inner.eval(scope)? {
                Value::Number(value) => Ok(Value::Number(-value)),
                _ => Err(ExprError::TypeMismatch { op: "-" }),
            },
            Self::Binary(BinaryOp::And, left, right) => {
                if !expect_bool(left.eval(scope)?, BinaryOp::And)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(expect_bool(right.eval(scope)?, BinaryOp::And)?))
            }
            Self::Binary(BinaryOp::Or, left, right) => {
                if expect_bool(left.eval(scope)?, BinaryOp::Or)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(expect_bool(right.eval(scope)?, BinaryOp::Or)?))
            }
            Self::Binary(op, left, right) => apply(*op, left.eval(scope)?, right.eval(scope)?),
        }
    }

    /// Row admission: only an explicit `false` rejects. Evaluation errors
    /// admit the row.
    pub fn admits(&self, scope: &dyn Scope) -> bool {
        match self.eval(scope) {
            Ok(Value::Bool(false)) => false,
            Ok(_) => true,
            Err(error) => {
                tracing::trace!(%error, "expression error, row admitted");
                true
            }
        }
    }
}

fn expect_bool(value: Value, op: BinaryOp) -> Result<bool, ExprError> {
    match value {
        Value::Bool(value) => Ok(value),
        _ => Err(ExprError::TypeMismatch { op: op.symbol() }),
    }
}

fn apply(op: BinaryOp, left: Value, right: Value) -> Result<Value, ExprError> {
    let mismatch = || ExprError::TypeMismatch { op: op.symbol() };
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
            _ => Err(mismatch()),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(mismatch());
            };
            match op {
                BinaryOp::Sub => Ok(Value::Number(a - b)),
                BinaryOp::Mul => Ok(Value::Number(a * b)),
                _ if b == 0.0 => Err(ExprError::DivisionByZero),
                BinaryOp::Div => Ok(Value::Number(a / b)),
                _ => Ok(Value::Number(a % b)),
            }
        }
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
                _ => {
                    tracing::trace!(
                        left = left.type_name(),
                        right = right.type_name(),
                        "ordering across types"
                    );
                    return Err(mismatch());
                }
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Contains | BinaryOp::StartsWith | BinaryOp::EndsWith => {
            let (Some(haystack), Some(needle)) = (left.into_text(), right.into_text()) else {
                return Err(mismatch());
            };
            let result = match op {
                BinaryOp::Contains => haystack.contains(&needle),
                BinaryOp::StartsWith => haystack.starts_with(&needle),
                _ => haystack.ends_with(&needle),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled in eval"),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    Op(BinaryOp),
    Minus,
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

impl Token {
    fn unexpected(&self) -> ExprError {
        let found = match &self.kind {
            TokenKind::Number(value) => format!("number {value}"),
            TokenKind::Str(value) => format!("string {value:?}"),
            TokenKind::Ident(name) => format!("identifier {name}"),
            TokenKind::True => "true".to_owned(),
            TokenKind::False => "false".to_owned(),
            TokenKind::And => "and".to_owned(),
            TokenKind::Or => "or".to_owned(),
            TokenKind::Not => "not".to_owned(),
            TokenKind::Op(op) => format!("operator {}", op.symbol()),
            TokenKind::Minus => "operator -".to_owned(),
            TokenKind::LeftParen => "(".to_owned(),
            TokenKind::RightParen => ")".to_owned(),
        };
        ExprError::UnexpectedToken {
            position: self.position,
            found,
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        while let Some((position, ch)) = self.chars.next() {
            let kind = match ch {
                c if c.is_whitespace() => continue,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '+' => TokenKind::Op(BinaryOp::Add),
                '-' => TokenKind::Minus,
                '*' => TokenKind::Op(BinaryOp::Mul),
                '/' => TokenKind::Op(BinaryOp::Div),
                '%' => TokenKind::Op(BinaryOp::Rem),
                '=' => {
                    self.eat('=');
                    TokenKind::Op(BinaryOp::Eq)
                }
                '!' if self.eat('=') => TokenKind::Op(BinaryOp::Ne),
                '!' => TokenKind::Not,
                '<' if self.eat('=') => TokenKind::Op(BinaryOp::Le),
                '<' => TokenKind::Op(BinaryOp::Lt),
                '>' if self.eat('=') => TokenKind::Op(BinaryOp::Ge),
                '>' => TokenKind::Op(BinaryOp::Gt),
                '&' if self.eat('&') => TokenKind::And,
                '|' if self.eat('|') => TokenKind::Or,
                '"' | '\'' => TokenKind::Str(self.string(position, ch)?),
                c if c.is_ascii_digit() => self.number(position)?,
                c if c.is_alphabetic() || c == '_' => self.word(position),
                found => return Err(ExprError::UnexpectedChar { position, found }),
            };
            tokens.push(Token { kind, position });
        }
        Ok(tokens)
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|(_, ch)| *ch == expected).is_some()
    }

    fn end_of_run(&mut self, start: usize, accept: impl Fn(char) -> bool) -> usize {
        let mut end = start;
        while let Some((index, ch)) = self.chars.next_if(|(_, ch)| accept(*ch)) {
            end = index + ch.len_utf8();
        }
        end
    }

    fn string(&mut self, start: usize, quote: char) -> Result<String, ExprError> {
        let mut value = String::new();
        for (_, ch) in self.chars.by_ref() {
            if ch == quote {
                return Ok(value);
            }
            value.push(ch);
        }
        Err(ExprError::UnterminatedString { position: start })
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ExprError> {
        let end = self.end_of_run(start + 1, |ch| ch.is_ascii_digit() || ch == '.');
        let text = &self.source[start..end];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ExprError::UnexpectedToken {
                position: start,
                found: format!("number {text}"),
            })
    }

    fn word(&mut self, start: usize) -> TokenKind {
        let first_len = self.source[start..].chars().next().map_or(1, char::len_utf8);
        let end = self.end_of_run(start + first_len, |ch| {
            ch.is_alphanumeric() || ch == '_' || ch == '.'
        });
        match &self.source[start..end] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "contains" => TokenKind::Op(BinaryOp::Contains),
            "startsWith" => TokenKind::Op(BinaryOp::StartsWith),
            "endsWith" => TokenKind::Op(BinaryOp::EndsWith),
            name => TokenKind::Ident(name.to_owned()),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        self.current += 1;
        token
    }

    fn next_is(&self, accept: impl Fn(&TokenKind) -> bool) -> bool {
        self.peek().is_some_and(|token| accept(&token.kind))
    }

    // or -> and ("or" and)*
    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.next_is(|kind| *kind == TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_not()?;
        while self.next_is(|kind| *kind == TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.next_is(|kind| *kind == TokenKind::Not) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_additive()?;
        let Some(op) = self.peek().and_then(|token| match token.kind {
            TokenKind::Op(
                op @ (BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Contains
                | BinaryOp::StartsWith
                | BinaryOp::EndsWith),
            ) => Some(op),
            _ => None,
        }) else {
            return Ok(left);
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().map(|token| &token.kind) {
                Some(TokenKind::Op(BinaryOp::Add)) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|token| &token.kind) {
                Some(TokenKind::Op(op @ (BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem))) => *op,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.next_is(|kind| *kind == TokenKind::Minus) {
            self.advance();
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance().ok_or(ExprError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Literal(Value::Number(value))),
            TokenKind::Str(value) => Ok(Expr::Literal(Value::Text(value))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Ident(name) => Ok(Expr::Column(name)),
            TokenKind::LeftParen => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(other.unexpected()),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            _ => Err(token.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Expr, ExprError, RowScope, Scope, Value};
    use std::collections::HashMap;

    struct MapScope(HashMap<&'static str, Value>);

    impl Scope for MapScope {
        fn lookup(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
    }

    fn trade_scope() -> MapScope {
        MapScope(HashMap::from([
            ("price", Value::Number(120.5)),
            ("quantity", Value::Number(300.0)),
            ("side", Value::Text("BUY".to_owned())),
            ("venue", Value::Text("XNAS".to_owned())),
        ]))
    }

    fn eval(source: &str) -> Result<Value, ExprError> {
        Expr::parse(source).expect("parse").eval(&trade_scope())
    }

    #[test]
    fn value_from_cell_prefers_numbers() {
        assert_eq!(Value::from_cell("42"), Value::Number(42.0));
        assert_eq!(Value::from_cell("-1.5e2"), Value::Number(-150.0));
        assert_eq!(Value::from_cell("42a"), Value::Text("42a".to_owned()));
        assert_eq!(Value::from_cell(""), Value::Text(String::new()));
    }

    #[test]
    fn comparisons_and_boolean_logic() {
        assert_eq!(eval("price > 100"), Ok(Value::Bool(true)));
        assert_eq!(eval("price > 100 and side == \"SELL\""), Ok(Value::Bool(false)));
        assert_eq!(eval("price > 500 or side == 'BUY'"), Ok(Value::Bool(true)));
        assert_eq!(eval("!(quantity <= 300)"), Ok(Value::Bool(false)));
        assert_eq!(eval("not venue != \"XNAS\""), Ok(Value::Bool(true)));
        assert_eq!(eval("price >= 120.5 && quantity < 301"), Ok(Value::Bool(true)));
        assert_eq!(eval("side = 'BUY' || false"), Ok(Value::Bool(true)));
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Number(7.0)));
        assert_eq!(eval("(1 + 2) * 3"), Ok(Value::Number(9.0)));
        assert_eq!(eval("-quantity / 100"), Ok(Value::Number(-3.0)));
        assert_eq!(eval("quantity % 7"), Ok(Value::Number(6.0)));
        assert_eq!(eval("price * quantity > 36000"), Ok(Value::Bool(true)));
        assert_eq!(eval("side + venue"), Ok(Value::Text("BUYXNAS".to_owned())));
    }

    #[test]
    fn string_predicates() {
        assert_eq!(eval("venue contains 'NA'"), Ok(Value::Bool(true)));
        assert_eq!(eval("venue startsWith \"XN\""), Ok(Value::Bool(true)));
        assert_eq!(eval("venue endsWith \"XN\""), Ok(Value::Bool(false)));
        assert_eq!(eval("quantity contains '30'"), Ok(Value::Bool(true)));
    }

    #[test]
    fn evaluation_errors() {
        assert_eq!(
            eval("missing > 1"),
            Err(ExprError::UnknownIdentifier("missing".to_owned()))
        );
        assert_eq!(eval("side > 1"), Err(ExprError::TypeMismatch { op: ">" }));
        assert_eq!(eval("price / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(eval("price and true"), Err(ExprError::TypeMismatch { op: "and" }));
    }

    #[test]
    fn equality_across_types_is_false() {
        assert_eq!(eval("side == 1"), Ok(Value::Bool(false)));
        assert_eq!(eval("side != 1"), Ok(Value::Bool(true)));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            Expr::parse("price >"),
            Err(ExprError::UnexpectedEnd)
        ));
        assert!(matches!(
            Expr::parse("price > 1 )"),
            Err(ExprError::UnexpectedToken { position: 10, .. })
        ));
        assert!(matches!(
            Expr::parse("side == 'BUY"),
            Err(ExprError::UnterminatedString { position: 8 })
        ));
        assert!(matches!(
            Expr::parse("price # 3"),
            Err(ExprError::UnexpectedChar { found: '#', .. })
        ));
        assert!(matches!(
            Expr::parse("(price > 1"),
            Err(ExprError::UnexpectedEnd)
        ));
        assert!(matches!(
            Expr::parse("1.2.3 > 0"),
            Err(ExprError::UnexpectedToken { position: 0, .. })
        ));
    }

    #[test]
    fn admits_only_rejects_explicit_false() {
        let header = vec!["a".to_owned(), "b".to_owned()];
        let row = vec!["5".to_owned(), "text".to_owned()];
        let scope = RowScope {
            header: &header,
            row: &row,
        };

        assert!(Expr::parse("a > 1").expect("parse").admits(&scope));
        assert!(!Expr::parse("a > 10").expect("parse").admits(&scope));
        assert!(Expr::parse("b > 10").expect("parse").admits(&scope));
        assert!(Expr::parse("nope == 1").expect("parse").admits(&scope));
        assert!(Expr::parse("a + 1").expect("parse").admits(&scope));
    }

    #[test]
    fn dotted_identifiers_name_columns() {
        let header = vec!["order.id".to_owned()];
        let row = vec!["7".to_owned()];
        let scope = RowScope {
            header: &header,
            row: &row,
        };
        let expr = Expr::parse("order.id == 7").expect("parse");
        assert_eq!(expr.eval(&scope), Ok(Value::Bool(true)));
    }
}
