//! Arithmetic for the `calculate` tool.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-')* primary
//! primary := '(' expr ')' | number
//! ```
//!
//! Parentheses nest at most [`MAX_NESTING`] deep, and a factor takes at
//! most that many leading signs.

use thiserror::Error;

pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("Invalid mathematical expression: expression is empty")]
    Empty,
    #[error("Invalid mathematical expression: unexpected '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },
    #[error("Invalid mathematical expression: unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid mathematical expression: malformed number '{0}'")]
    MalformedNumber(String),
    #[error("Error evaluating expression: division by zero")]
    DivisionByZero,
    #[error("Invalid mathematical expression: nested deeper than {limit}")]
    TooDeep { limit: usize },
}

/// Evaluate `input` with the usual precedence rules. Whitespace is ignored
/// and error positions count only the remaining characters.
pub fn evaluate(input: &str) -> Result<f64, ExpressionError> {
    let chars: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        chars,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(found) => Err(ExpressionError::UnexpectedChar {
            found,
            position: parser.pos,
        }),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, ExpressionError> {
        let mut acc = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == '+' {
                acc += rhs;
            } else {
                acc -= rhs;
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, ExpressionError> {
        let mut acc = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                acc *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                acc /= rhs;
            }
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<f64, ExpressionError> {
        let mut negate = false;
        let mut signs = 0;
        while let Some(sign @ ('+' | '-')) = self.peek() {
            signs += 1;
            if signs > MAX_NESTING {
                return Err(ExpressionError::TooDeep { limit: MAX_NESTING });
            }
            self.pos += 1;
            negate ^= sign == '-';
        }
        let value = self.primary()?;
        Ok(if negate { -value } else { value })
    }

    fn primary(&mut self) -> Result<f64, ExpressionError> {
        match self.peek() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some('(') => {
                if self.depth == MAX_NESTING {
                    return Err(ExpressionError::TooDeep { limit: MAX_NESTING });
                }
                self.depth += 1;
                self.pos += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.peek() {
                    Some(')') => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some(found) => Err(ExpressionError::UnexpectedChar {
                        found,
                        position: self.pos,
                    }),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(found) => Err(ExpressionError::UnexpectedChar {
                found,
                position: self.pos,
            }),
        }
    }

    fn number(&mut self) -> Result<f64, ExpressionError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse()
            .map_err(|_| ExpressionError::MalformedNumber(literal))
    }
}
