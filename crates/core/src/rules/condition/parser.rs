//! Recursive-descent parser for rule conditions.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! or         := and ("or" and)*
//! and        := not ("and" not)*
//! not        := "not" not | comparison
//! comparison := operand ( cmp operand
//!                       | "in" operand
//!                       | "not" "in" operand
//!                       | "is" ["not"] operand )?
//! operand    := string | ["-"] number | "true" | "false" | "null"
//!             | identifier | "(" or ")" | "[" [operand ("," operand)*] "]"
//! ```

use super::ast::{CompareOp, Expr, Value};
use super::lexer::{Spanned, Token, tokenize};
use crate::rules::error::RuleError;

/// Compiles a condition string into an expression tree.
pub fn parse(source: &str) -> Result<Expr, RuleError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(RuleError::syntax(0, "condition is empty"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.chars().count(),
    };
    let expr = parser.parse_or()?;

    if let Some(extra) = parser.peek_spanned() {
        return Err(RuleError::syntax(
            extra.position,
            format!("unexpected {} after end of expression", extra.token),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), RuleError> {
        match self.advance() {
            Some(s) if &s.token == expected => Ok(()),
            Some(s) => Err(RuleError::syntax(
                s.position,
                format!("expected {expected}, found {}", s.token),
            )),
            None => Err(RuleError::syntax(
                self.end,
                format!("expected {expected}, found end of condition"),
            )),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, RuleError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, RuleError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, RuleError> {
        if self.eat(&Token::Not) {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, RuleError> {
        let left = self.parse_operand()?;

        let expr = match self.peek() {
            Some(Token::Compare(op)) => {
                let op = *op;
                self.pos += 1;
                let right = self.parse_operand()?;
                Expr::Compare {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            Some(Token::In) => {
                self.pos += 1;
                let haystack = self.parse_operand()?;
                Expr::In {
                    needle: Box::new(left),
                    haystack: Box::new(haystack),
                    negated: false,
                }
            }
            Some(Token::Not) if self.peek_at(1) == Some(&Token::In) => {
                self.pos += 2;
                let haystack = self.parse_operand()?;
                Expr::In {
                    needle: Box::new(left),
                    haystack: Box::new(haystack),
                    negated: true,
                }
            }
            Some(Token::Is) => {
                self.pos += 1;
                let op = if self.eat(&Token::Not) {
                    CompareOp::Ne
                } else {
                    CompareOp::Eq
                };
                let right = self.parse_operand()?;
                Expr::Compare {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            _ => left,
        };
        Ok(expr)
    }

    fn parse_operand(&mut self) -> Result<Expr, RuleError> {
        let Some(Spanned { token, position }) = self.advance() else {
            return Err(RuleError::syntax(self.end, "unexpected end of condition"));
        };

        let expr = match token {
            Token::Str(s) => Expr::Literal(Value::Text(s)),
            Token::Number(n) => Expr::Literal(Value::Number(n)),
            Token::Minus => match self.advance() {
                Some(Spanned {
                    token: Token::Number(n),
                    ..
                }) => Expr::Literal(Value::Number(-n)),
                _ => return Err(RuleError::syntax(position, "expected a number after '-'")),
            },
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Null => Expr::Literal(Value::Null),
            Token::Ident(name) => Expr::Field(name),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                inner
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.parse_operand()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::RBracket)?;
                }
                Expr::List(items)
            }
            other => {
                return Err(RuleError::syntax(
                    position,
                    format!("expected a value, found {other}"),
                ));
            }
        };
        Ok(expr)
    }
}
