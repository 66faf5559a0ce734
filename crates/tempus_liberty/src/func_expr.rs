//! Liberty Boolean function expressions.
//!
//! Parses the `function` / `when` attribute syntax:
//!
//! | syntax              | meaning |
//! |---------------------|---------|
//! | `!A`, `A'`          | not     |
//! | `A & B`, `A * B`, `A B` | and |
//! | `A \| B`, `A + B`   | or      |
//! | `A ^ B`             | xor     |
//! | `0`, `1`            | constants |
//!
//! Precedence from loosest to tightest: or, xor, and, not.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Errors from [`FuncExpr::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FuncExprError {
    /// A character that is not part of the expression syntax.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the expression.
        offset: usize,
    },
    /// The expression stopped where an operand was expected.
    #[error("expression ends where an operand was expected")]
    UnexpectedEnd,
    /// A token in the wrong place, such as `)` with no matching `(`.
    #[error("unexpected '{token}' at offset {offset}")]
    UnexpectedToken {
        /// The token text.
        token: String,
        /// Byte offset into the expression.
        offset: usize,
    },
}

/// A Boolean function over cell port names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuncExpr {
    /// The value of a port.
    Port(String),
    /// Negation.
    Not(Box<FuncExpr>),
    /// Conjunction.
    And(Box<FuncExpr>, Box<FuncExpr>),
    /// Disjunction.
    Or(Box<FuncExpr>, Box<FuncExpr>),
    /// Exclusive or.
    Xor(Box<FuncExpr>, Box<FuncExpr>),
    /// Constant true.
    One,
    /// Constant false.
    Zero,
}

impl FuncExpr {
    /// Parses a liberty function string.
    pub fn parse(text: &str) -> Result<Self, FuncExprError> {
        let tokens = lex(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(tok) => Err(FuncExprError::UnexpectedToken {
                token: tok.kind.to_string(),
                offset: tok.offset,
            }),
        }
    }

    /// Evaluates the function for the given port values. Returns `None`
    /// when a port the function reads has no value.
    pub fn eval(&self, state: &HashMap<String, bool>) -> Option<bool> {
        Some(match self {
            FuncExpr::Port(name) => *state.get(name)?,
            FuncExpr::Not(e) => !e.eval(state)?,
            FuncExpr::And(a, b) => a.eval(state)? & b.eval(state)?,
            FuncExpr::Or(a, b) => a.eval(state)? | b.eval(state)?,
            FuncExpr::Xor(a, b) => a.eval(state)? ^ b.eval(state)?,
            FuncExpr::One => true,
            FuncExpr::Zero => false,
        })
    }

    /// Port names the function reads, sorted and without duplicates.
    pub fn ports(&self) -> BTreeSet<&str> {
        let mut ports = BTreeSet::new();
        self.collect_ports(&mut ports);
        ports
    }

    fn collect_ports<'e>(&'e self, ports: &mut BTreeSet<&'e str>) {
        match self {
            FuncExpr::Port(name) => {
                ports.insert(name.as_str());
            }
            FuncExpr::Not(e) => e.collect_ports(ports),
            FuncExpr::And(a, b) | FuncExpr::Or(a, b) | FuncExpr::Xor(a, b) => {
                a.collect_ports(ports);
                b.collect_ports(ports);
            }
            FuncExpr::One | FuncExpr::Zero => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            FuncExpr::Or(..) => 0,
            FuncExpr::Xor(..) => 1,
            FuncExpr::And(..) => 2,
            FuncExpr::Not(_) => 3,
            FuncExpr::Port(_) | FuncExpr::One | FuncExpr::Zero => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for FuncExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, op, b) = match self {
            FuncExpr::Port(name) => return f.write_str(name),
            FuncExpr::One => return f.write_str("1"),
            FuncExpr::Zero => return f.write_str("0"),
            FuncExpr::Not(e) => {
                f.write_str("!")?;
                return e.fmt_operand(f, 3);
            }
            FuncExpr::And(a, b) => (a, "&", b),
            FuncExpr::Or(a, b) => (a, "|", b),
            FuncExpr::Xor(a, b) => (a, "^", b),
        };
        let level = self.precedence();
        a.fmt_operand(f, level)?;
        write!(f, " {op} ")?;
        b.fmt_operand(f, level + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Port(String),
    One,
    Zero,
    Not,
    Prime,
    And,
    Or,
    Xor,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Port(name) => f.write_str(name),
            TokenKind::One => f.write_str("1"),
            TokenKind::Zero => f.write_str("0"),
            TokenKind::Not => f.write_str("!"),
            TokenKind::Prime => f.write_str("'"),
            TokenKind::And => f.write_str("&"),
            TokenKind::Or => f.write_str("|"),
            TokenKind::Xor => f.write_str("^"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn is_port_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '[' | ']' | '.')
}

fn lex(text: &str) -> Result<Vec<Token>, FuncExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() || c == '"' => {
                chars.next();
                continue;
            }
            '!' => TokenKind::Not,
            '\'' => TokenKind::Prime,
            '&' | '*' => TokenKind::And,
            '|' | '+' => TokenKind::Or,
            '^' => TokenKind::Xor,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if is_port_char(c) => {
                let mut end = offset;
                while let Some(&(i, c)) = chars.peek() {
                    if !is_port_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let word = &text[offset..end];
                tokens.push(Token {
                    kind: match word {
                        "1" => TokenKind::One,
                        "0" => TokenKind::Zero,
                        _ => TokenKind::Port(word.to_string()),
                    },
                    offset,
                });
                continue;
            }
            ch => return Err(FuncExprError::UnexpectedChar { ch, offset }),
        };
        chars.next();
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<FuncExpr, FuncExprError> {
        let mut lhs = self.xor()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.xor()?;
            lhs = FuncExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn xor(&mut self) -> Result<FuncExpr, FuncExprError> {
        let mut lhs = self.and()?;
        while self.eat(&TokenKind::Xor) {
            let rhs = self.and()?;
            lhs = FuncExpr::Xor(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<FuncExpr, FuncExprError> {
        let mut lhs = self.unary()?;
        loop {
            let juxtaposed = matches!(
                self.peek(),
                Some(
                    TokenKind::Port(_)
                        | TokenKind::One
                        | TokenKind::Zero
                        | TokenKind::Not
                        | TokenKind::LParen
                )
            );
            if !self.eat(&TokenKind::And) && !juxtaposed {
                return Ok(lhs);
            }
            let rhs = self.unary()?;
            lhs = FuncExpr::And(Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<FuncExpr, FuncExprError> {
        if self.eat(&TokenKind::Not) {
            return Ok(FuncExpr::Not(Box::new(self.unary()?)));
        }
        let mut expr = self.primary()?;
        while self.eat(&TokenKind::Prime) {
            expr = FuncExpr::Not(Box::new(expr));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<FuncExpr, FuncExprError> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(FuncExprError::UnexpectedEnd);
        };
        self.pos += 1;
        match token.kind {
            TokenKind::Port(name) => Ok(FuncExpr::Port(name)),
            TokenKind::One => Ok(FuncExpr::One),
            TokenKind::Zero => Ok(FuncExpr::Zero),
            TokenKind::LParen => {
                let inner = self.or()?;
                match self.tokens.get(self.pos) {
                    Some(t) if t.kind == TokenKind::RParen => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(t) => Err(FuncExprError::UnexpectedToken {
                        token: t.kind.to_string(),
                        offset: t.offset,
                    }),
                    None => Err(FuncExprError::UnexpectedEnd),
                }
            }
            other => Err(FuncExprError::UnexpectedToken {
                token: other.to_string(),
                offset: token.offset,
            }),
        }
    }
}
