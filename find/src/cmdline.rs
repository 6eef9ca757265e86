//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! `find [-H] [-L] [-P] [path...] [expression]`

use std::path::PathBuf;

use gettextrs::gettext;

use crate::error::ParseError;
use crate::expr::Expr;
use crate::parser::{parse_expression, Parsed};
use crate::registry::Registry;
use crate::walk::SymlinkPolicy;

/// A fully parsed command line, ready to walk.
#[derive(Debug)]
pub struct Invocation {
    pub policy: SymlinkPolicy,
    pub paths: Vec<PathBuf>,
    pub expr: Expr,
}

#[derive(Debug)]
pub enum Command {
    Find(Invocation),
    Help,
    Version,
}

fn long_option(name: &str) -> Result<Command, ParseError> {
    match name {
        "help" => Ok(Command::Help),
        "version" => Ok(Command::Version),
        _ => Err(ParseError::UnknownOption(name.to_string())),
    }
}

/// Tokens that end the list of paths.
fn starts_expression(arg: &str) -> bool {
    matches!(arg.chars().next(), Some('-' | '!' | '('))
}

/// Parse command line arguments (without the program name).
pub fn parse_args(args: &[String], registry: &Registry) -> Result<Command, ParseError> {
    let mut policy = SymlinkPolicy::default();
    let mut idx = 0;

    // -H, -L, -P; the last one wins
    while idx < args.len() {
        let arg = args[idx].as_str();
        if let Some(name) = arg.strip_prefix("--") {
            return long_option(name);
        }
        match arg {
            "-H" => policy = SymlinkPolicy::CommandLine,
            "-L" => policy = SymlinkPolicy::Always,
            "-P" => policy = SymlinkPolicy::Never,
            _ => break,
        }
        idx += 1;
    }

    let mut paths = Vec::new();
    while idx < args.len() && !starts_expression(&args[idx]) {
        paths.push(PathBuf::from(&args[idx]));
        idx += 1;
    }
    if paths.is_empty() {
        paths.push(PathBuf::from("."));
    }

    match parse_expression(&args[idx..], registry)? {
        Parsed::Expr(expr) => Ok(Command::Find(Invocation {
            policy,
            paths,
            expr,
        })),
        Parsed::LongOption(name) => long_option(&name),
    }
}

pub fn help_text(registry: &Registry) -> String {
    let mut s = String::new();
    s.push_str(&gettext("Usage: find [-H] [-L] [-P] [path...] [expression]\n"));
    s.push_str(&gettext("\nOPTIONS (the last wins):\n"));
    s.push_str(&gettext(
        "  -P    Never follow symbolic links. This is the default behavior.\n",
    ));
    s.push_str(&gettext("  -L    Follow symbolic links.\n"));
    s.push_str(&gettext(
        "  -H    Follow symbolic link only of the provided paths.\n\n",
    ));
    s.push_str(&gettext("Default path is the current directory.\n"));
    s.push_str(&gettext(
        "Default expression is -print, expression may consist of:\n    operators, tests, and actions.\n",
    ));
    s.push_str(&gettext("\nOPERATORS (decreasing precedence):\n"));
    s.push_str(&gettext(
        "    ( EXPR )\n    ! EXPR  -not EXPR\n    EXPR1 -a EXPR2  EXPR1 -and EXPR2\n    EXPR1 -o EXPR2  EXPR1 -or EXPR2\n",
    ));

    s.push_str(&gettext("\nTESTS:\n"));
    for test in registry.tests() {
        s.push_str(test.help);
    }
    s.push_str(&gettext("\nACTIONS:\n"));
    for action in registry.actions() {
        s.push_str(action.help);
    }
    s
}

pub fn version_text() -> String {
    format!(
        "{} {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
