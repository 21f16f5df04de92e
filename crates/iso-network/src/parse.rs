//! Formula parser.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := '-' unary | power
//! power := atom ('^' unary)?
//! atom  := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! Identifiers may contain one `.` to address a component's isotope value
//! (`CH3X.C`); classification happens later, in the network compiler.

use crate::error::ConfigurationError;
use crate::expr::{BinOp, Expr, Func};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

/// Parse a formula into an expression tree.
pub fn parse(input: &str) -> Result<Expr, ConfigurationError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.expr()?;
    if let Some((at, tok)) = parser.tokens.get(parser.pos) {
        return Err(parser.error(*at, format!("unexpected {tok:?}")));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ConfigurationError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push((i, Token::Op(c)));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            ',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // exponent: e, E, optionally signed
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        while j < bytes.len() && bytes[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text = &input[start..i];
                let value = text.parse::<f64>().map_err(|_| ConfigurationError::Parse {
                    input: input.to_string(),
                    position: start,
                    message: format!("invalid number '{text}'"),
                })?;
                tokens.push((start, Token::Number(value)));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push((start, Token::Ident(input[start..i].to_string())));
            }
            other => {
                return Err(ConfigurationError::Parse {
                    input: input.to_string(),
                    position: i,
                    message: format!("unexpected character '{other}'"),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, position: usize, message: String) -> ConfigurationError {
        ConfigurationError::Parse {
            input: self.input.to_string(),
            position,
            message,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.input.len(), |(at, _)| *at)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        tok
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(c) => {
                let c = *c;
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn expect(&mut self, want: Token) -> Result<(), ConfigurationError> {
        let at = self.here();
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(self.error(at, format!("expected {want:?}, found {tok:?}"))),
            None => Err(self.error(at, format!("expected {want:?}, found end of input"))),
        }
    }

    fn expr(&mut self) -> Result<Expr, ConfigurationError> {
        let mut lhs = self.term()?;
        while let Some(c) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if c == '+' { BinOp::Add } else { BinOp::Sub };
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ConfigurationError> {
        let mut lhs = self.unary()?;
        while let Some(c) = self.eat_op(&['*', '/']) {
            let rhs = self.unary()?;
            let op = if c == '*' { BinOp::Mul } else { BinOp::Div };
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ConfigurationError> {
        if self.eat_op(&['-']).is_some() {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ConfigurationError> {
        let base = self.atom()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ConfigurationError> {
        let at = self.here();
        match self.next() {
            Some(Token::Number(v)) => Ok(Expr::Const(v)),
            Some(Token::Ident(name)) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Expr::Symbol(name));
                }
                let func = Func::from_name(&name)
                    .ok_or_else(|| self.error(at, format!("unknown function '{name}'")))?;
                self.expect(Token::LParen)?;
                let mut args = vec![self.expr()?];
                while self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    args.push(self.expr()?);
                }
                self.expect(Token::RParen)?;
                if args.len() != func.arity() {
                    return Err(self.error(
                        at,
                        format!(
                            "{}() takes {} argument(s), got {}",
                            func.name(),
                            func.arity(),
                            args.len()
                        ),
                    ));
                }
                Ok(Expr::call(func, args))
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(self.error(at, format!("unexpected {tok:?}"))),
            None => Err(self.error(at, "unexpected end of input".to_string())),
        }
    }
}
