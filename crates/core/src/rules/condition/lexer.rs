//! Tokenizer for rule conditions.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::ast::CompareOp;
use crate::rules::error::RuleError;

/// Lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Str(String),
    Number(Decimal),
    Compare(CompareOp),
    Minus,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    And,
    Or,
    Not,
    In,
    Is,
    True,
    False,
    Null,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier '{name}'"),
            Self::Str(s) => write!(f, "string \"{s}\""),
            Self::Number(n) => write!(f, "number {n}"),
            Self::Compare(op) => write!(f, "'{}'", op.symbol()),
            Self::Minus => f.write_str("'-'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LBracket => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::Comma => f.write_str("','"),
            Self::And => f.write_str("'and'"),
            Self::Or => f.write_str("'or'"),
            Self::Not => f.write_str("'not'"),
            Self::In => f.write_str("'in'"),
            Self::Is => f.write_str("'is'"),
            Self::True => f.write_str("'true'"),
            Self::False => f.write_str("'false'"),
            Self::Null => f.write_str("'null'"),
        }
    }
}

/// Token with its character offset in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

fn keyword(word: &str) -> Option<Token> {
    let token = match word.to_ascii_lowercase().as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "is" => Token::Is,
        "true" => Token::True,
        "false" => Token::False,
        "null" | "none" => Token::Null,
        _ => return None,
    };
    Some(token)
}

/// Splits a condition into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, RuleError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        let start = i;
        let next = chars.get(i + 1).copied();

        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '-' => Token::Minus,
            '=' if next == Some('=') => {
                i += 1;
                Token::Compare(CompareOp::Eq)
            }
            '=' => return Err(RuleError::syntax(start, "unexpected '=', use '==' for equality")),
            '!' if next == Some('=') => {
                i += 1;
                Token::Compare(CompareOp::Ne)
            }
            '!' => return Err(RuleError::syntax(start, "unexpected '!', use 'not' for negation")),
            '>' if next == Some('=') => {
                i += 1;
                Token::Compare(CompareOp::Ge)
            }
            '>' => Token::Compare(CompareOp::Gt),
            '<' if next == Some('=') => {
                i += 1;
                Token::Compare(CompareOp::Le)
            }
            '<' => Token::Compare(CompareOp::Lt),
            '"' | '\'' => {
                let (value, end) = read_string(&chars, start)?;
                i = end;
                tokens.push(Spanned {
                    token: Token::Str(value),
                    position: start,
                });
                continue;
            }
            c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                while chars
                    .get(i)
                    .is_some_and(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '_')
                {
                    i += 1;
                }
                if chars
                    .get(i)
                    .is_some_and(|ch| ch.is_alphabetic())
                {
                    return Err(RuleError::syntax(start, "identifiers cannot start with a digit"));
                }
                let text: String = chars[start..i].iter().filter(|ch| **ch != '_').collect();
                let number = Decimal::from_str(&text)
                    .map_err(|_| RuleError::syntax(start, format!("invalid number '{text}'")))?;
                tokens.push(Spanned {
                    token: Token::Number(number),
                    position: start,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                while chars
                    .get(i)
                    .is_some_and(|ch| ch.is_alphanumeric() || *ch == '_')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = keyword(&word).unwrap_or(Token::Ident(word));
                tokens.push(Spanned {
                    token,
                    position: start,
                });
                continue;
            }
            other => {
                return Err(RuleError::syntax(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };

        i += 1;
        tokens.push(Spanned {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

/// Reads a quoted string starting at `start`. Returns the unescaped value
/// and the index just past the closing quote.
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), RuleError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while let Some(&ch) = chars.get(i) {
        match ch {
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    break;
                };
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }

    Err(RuleError::syntax(start, "unterminated string literal"))
}
