//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Expression parser.
//!
//! Precedence, from highest: `( EXPR )`, `! EXPR` / `-not EXPR`,
//! `EXPR -a EXPR` / `EXPR -and EXPR` (also plain juxtaposition),
//! `EXPR -o EXPR` / `EXPR -or EXPR`. Binary operators associate to the left.

use crate::error::ParseError;
use crate::expr::Expr;
use crate::registry::Registry;

/// Outcome of parsing the expression part of the command line.
#[derive(Debug)]
pub enum Parsed {
    Expr(Expr),
    /// A `--NAME` token was found; parsing stopped there.
    LongOption(String),
}

/// Why a parse function returned early.
enum Stop {
    Error(ParseError),
    LongOption(String),
}

impl From<ParseError> for Stop {
    fn from(e: ParseError) -> Self {
        Stop::Error(e)
    }
}

/// Deepest accepted nesting of `(` and `!`.
pub const MAX_NESTING: usize = 256;

fn is_not(tok: &str) -> bool {
    tok == "!" || tok == "-not"
}

fn is_and(tok: &str) -> bool {
    tok == "-a" || tok == "-and"
}

fn is_or(tok: &str) -> bool {
    tok == "-o" || tok == "-or"
}

struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
    /// Number of currently open `(`
    depth: usize,
    /// Open `(` plus pending `!`, bounded by [`MAX_NESTING`]
    nesting: usize,
    registry: &'a Registry,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(|s| s.as_str())
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn enter(&mut self) -> Result<(), Stop> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::NestedTooDeep(MAX_NESTING).into());
        }
        self.nesting += 1;
        Ok(())
    }

    /// OR expression (lowest precedence)
    fn parse_or(&mut self, after: Option<&'a str>) -> Result<Expr, Stop> {
        let mut left = self.parse_and(after)?;

        while let Some(tok) = self.peek() {
            if !is_or(tok) {
                break;
            }
            self.pos += 1;
            let right = self.parse_and(Some(tok))?;
            left = Expr::or(left, right);
        }

        Ok(left)
    }

    /// AND expression, explicit or by juxtaposition
    fn parse_and(&mut self, after: Option<&'a str>) -> Result<Expr, Stop> {
        let mut left = self.parse_unary(after)?;

        while let Some(tok) = self.peek() {
            if is_or(tok) || tok == ")" {
                break;
            }
            let right = if is_and(tok) {
                self.pos += 1;
                self.parse_unary(Some(tok))?
            } else {
                self.parse_unary(None)?
            };
            left = Expr::and(left, right);
        }

        Ok(left)
    }

    /// Unary expression: NOT, parenthesized group or terminal.
    ///
    /// `after` is the operator preceding the operand, for diagnostics.
    fn parse_unary(&mut self, after: Option<&'a str>) -> Result<Expr, Stop> {
        let tok = match self.peek() {
            Some(tok) => tok,
            None => {
                let after = after.unwrap_or_default().to_string();
                return Err(ParseError::MissingOperand(after).into());
            }
        };

        if is_not(tok) {
            self.pos += 1;
            self.enter()?;
            let e = self.parse_unary(Some(tok))?;
            self.nesting -= 1;
            return Ok(Expr::not(e));
        }

        if tok == "(" {
            self.pos += 1;
            self.enter()?;
            self.depth += 1;
            let e = self.parse_or(Some(tok))?;
            if self.next() != Some(")") {
                return Err(ParseError::MissingCloseParen.into());
            }
            self.depth -= 1;
            self.nesting -= 1;
            return Ok(e);
        }

        if tok == ")" && self.depth == 0 {
            return Err(ParseError::UnmatchedCloseParen.into());
        }

        if tok == ")" || is_and(tok) || is_or(tok) {
            let err = match after {
                Some(op) => ParseError::MissingOperand(op.to_string()),
                None => ParseError::MissingLeftOperand(tok.to_string()),
            };
            return Err(err.into());
        }

        self.parse_terminal()
    }

    /// A registered test or action, with its argument if it takes one.
    fn parse_terminal(&mut self) -> Result<Expr, Stop> {
        let tok = match self.next() {
            Some(tok) => tok,
            None => return Err(ParseError::MissingOperand(String::new()).into()),
        };

        if let Some(name) = tok.strip_prefix("--") {
            return Err(Stop::LongOption(name.to_string()));
        }

        let id = match tok.strip_prefix('-') {
            Some(id) => id,
            None => return Err(ParseError::InvalidExpression(tok.to_string()).into()),
        };

        let raw = self.peek();
        let expr = if let Some(desc) = self.registry.test(id) {
            Expr::new_test(desc, raw)?
        } else if let Some(desc) = self.registry.action(id) {
            Expr::new_action(desc, raw)?
        } else {
            return Err(ParseError::InvalidExpression(tok.to_string()).into());
        };

        if expr.argument().is_some() {
            self.pos += 1;
        }
        Ok(expr)
    }
}

/// Parse the expression tokens that follow the paths.
///
/// An empty token list means `-print`. If the expression contains no action,
/// it is wrapped as `( EXPR ) -a -print`.
pub fn parse_expression(tokens: &[String], registry: &Registry) -> Result<Parsed, ParseError> {
    let print = registry.default_action();
    if tokens.is_empty() {
        return Ok(Parsed::Expr(Expr::new_action(&print, None)?));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nesting: 0,
        registry,
    };

    let result = parser.parse_or(None).and_then(|expr| {
        if parser.pos < tokens.len() {
            // parse_or only stops early on a `)` it could not match
            Err(ParseError::UnmatchedCloseParen.into())
        } else {
            Ok(expr)
        }
    });

    match result {
        Ok(expr) => {
            let expr = if expr.has_action() {
                expr
            } else {
                Expr::and(expr, Expr::new_action(&print, None)?)
            };
            log::debug!("parsed expression: {:?}", expr);
            Ok(Parsed::Expr(expr))
        }
        Err(Stop::LongOption(name)) => Ok(Parsed::LongOption(name)),
        Err(Stop::Error(e)) => Err(e),
    }
}
