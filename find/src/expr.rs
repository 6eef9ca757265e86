//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io::{self, Write};

use crate::error::ParseError;
use crate::registry::{
    ActionDescriptor, Arity, Effect, FileInfo, Predicate, TerminalKind, TestDescriptor,
};

/// A terminal of the expression together with its raw argument.
#[derive(Debug)]
pub struct Leaf<T: ?Sized> {
    pub id: &'static str,
    pub argument: Option<String>,
    pub imp: Box<T>,
}

/// Expression tree node
#[derive(Debug)]
pub enum Expr {
    Test(Leaf<dyn Predicate>),
    Action(Leaf<dyn Effect>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Where actions write, plus the first write error seen since the last
/// [`Sink::take_error`].
pub struct Sink<'a> {
    out: &'a mut dyn Write,
    error: Option<io::Error>,
}

impl<'a> Sink<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, error: None }
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Tokens that start an operator or a terminal can't be terminal arguments.
pub fn looks_like_token(arg: &str) -> bool {
    matches!(arg.chars().next(), Some('-' | '!' | '(' | ')'))
}

fn accept_argument<'a>(
    id: &'static str,
    kind: TerminalKind,
    arity: Arity,
    raw: Option<&'a str>,
) -> Result<Option<&'a str>, ParseError> {
    let candidate = raw.filter(|arg| !looks_like_token(arg));
    match arity {
        Arity::Mandatory => match candidate {
            Some(arg) => Ok(Some(arg)),
            None => Err(ParseError::MissingArgument { id, kind }),
        },
        Arity::Optional => Ok(candidate),
        Arity::None => match candidate {
            Some(_) => Err(ParseError::InvalidArgument { id, kind }),
            None => Ok(None),
        },
    }
}

impl Expr {
    /// Build a test leaf, validating `raw` against the descriptor's arity.
    ///
    /// `raw` is the token following the terminal on the command line, if
    /// any; [`Expr::argument`] tells whether it was taken.
    pub fn new_test(descriptor: &TestDescriptor, raw: Option<&str>) -> Result<Expr, ParseError> {
        let kind = TerminalKind::Test;
        let arg = accept_argument(descriptor.id, kind, descriptor.arity, raw)?;
        let imp = (descriptor.build)(arg).map_err(|reason| ParseError::RejectedArgument {
            id: descriptor.id,
            kind,
            arg: arg.unwrap_or_default().to_string(),
            reason,
        })?;
        Ok(Expr::Test(Leaf {
            id: descriptor.id,
            argument: arg.map(String::from),
            imp,
        }))
    }

    /// Build an action leaf; same argument contract as [`Expr::new_test`].
    pub fn new_action(
        descriptor: &ActionDescriptor,
        raw: Option<&str>,
    ) -> Result<Expr, ParseError> {
        let kind = TerminalKind::Action;
        let arg = accept_argument(descriptor.id, kind, descriptor.arity, raw)?;
        let imp = (descriptor.build)(arg).map_err(|reason| ParseError::RejectedArgument {
            id: descriptor.id,
            kind,
            arg: arg.unwrap_or_default().to_string(),
            reason,
        })?;
        Ok(Expr::Action(Leaf {
            id: descriptor.id,
            argument: arg.map(String::from),
            imp,
        }))
    }

    pub fn not(e: Expr) -> Expr {
        Expr::Not(Box::new(e))
    }

    pub fn and(l: Expr, r: Expr) -> Expr {
        Expr::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: Expr, r: Expr) -> Expr {
        Expr::Or(Box::new(l), Box::new(r))
    }

    /// Argument taken by a leaf; `None` for groups.
    pub fn argument(&self) -> Option<&str> {
        match self {
            Expr::Test(leaf) => leaf.argument.as_deref(),
            Expr::Action(leaf) => leaf.argument.as_deref(),
            _ => None,
        }
    }

    pub fn has_action(&self) -> bool {
        match self {
            Expr::Test(_) => false,
            Expr::Action(_) => true,
            Expr::Not(e) => e.has_action(),
            Expr::And(l, r) | Expr::Or(l, r) => l.has_action() || r.has_action(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Test(_) | Expr::Action(_) => 1,
            Expr::Not(e) => 1 + e.node_count(),
            Expr::And(l, r) | Expr::Or(l, r) => 1 + l.node_count() + r.node_count(),
        }
    }

    /// Evaluate the expression against a file.
    ///
    /// `-a` and `-o` short-circuit. Actions always count as true; a failed
    /// write is kept in `sink` for the caller to report.
    pub fn evaluate(&self, file: &FileInfo, sink: &mut Sink) -> bool {
        match self {
            Expr::Test(leaf) => leaf.imp.test(file),
            Expr::Action(leaf) => {
                if let Err(e) = leaf.imp.perform(file.path, &mut *sink.out) {
                    if sink.error.is_none() {
                        sink.error = Some(e);
                    }
                }
                true
            }
            Expr::Not(e) => !e.evaluate(file, sink),
            Expr::And(l, r) => l.evaluate(file, sink) && r.evaluate(file, sink),
            Expr::Or(l, r) => l.evaluate(file, sink) || r.evaluate(file, sink),
        }
    }
}
