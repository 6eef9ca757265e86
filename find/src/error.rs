//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io;
use std::path::PathBuf;

use crate::registry::TerminalKind;

/// Errors detected while turning the command line into an expression.
///
/// All of these abort the run before any file is visited.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("missing argument for -{id} {kind}.")]
    MissingArgument { id: &'static str, kind: TerminalKind },
    #[error("invalid argument for -{id} {kind}.")]
    InvalidArgument { id: &'static str, kind: TerminalKind },
    #[error("invalid argument `{arg}' for -{id} {kind}: {reason}")]
    RejectedArgument {
        id: &'static str,
        kind: TerminalKind,
        arg: String,
        reason: String,
    },
    #[error("invalid expression {0}")]
    InvalidExpression(String),
    #[error("expected an expression after {0}")]
    MissingOperand(String),
    #[error("expected an expression before {0}")]
    MissingLeftOperand(String),
    #[error("missing closing parenthesis")]
    MissingCloseParen,
    #[error("unexpected `)' without matching `('")]
    UnmatchedCloseParen,
    #[error("expression nested more than {0} levels deep")]
    NestedTooDeep(usize),
    #[error("unknown option --{0}")]
    UnknownOption(String),
}

/// Errors scoped to a single entry of the walk.
///
/// They are reported and the entry (or the subtree below it) is skipped.
#[derive(thiserror::Error, Debug)]
pub enum WalkError {
    #[error("unable to get file {} information ({source}).", path.display())]
    Stat { path: PathBuf, source: io::Error },
    #[error("unable to open directory {} ({source}).", path.display())]
    OpenDir { path: PathBuf, source: io::Error },
    #[error("error reading directory {} ({source}).", path.display())]
    ReadDir { path: PathBuf, source: io::Error },
    #[error(
        "File system loop detected; '{}' is part of the same file system loop as '{}'.",
        path.display(),
        ancestor.display()
    )]
    Loop { path: PathBuf, ancestor: PathBuf },
    #[error("write error: {0}")]
    Output(#[source] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
