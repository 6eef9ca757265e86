//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! find - search for files in a directory hierarchy
//!
//! The command line is parsed into an [`expr::Expr`] tree of tests and
//! actions taken from a [`registry::Registry`], which a [`walk::Walker`]
//! then evaluates against every file below the given paths.

use std::io::Write;

pub mod cmdline;
pub mod error;
pub mod expr;
pub mod parser;
pub mod primaries;
pub mod registry;
pub mod walk;

use cmdline::Command;
use error::Result;
use registry::Registry;
use walk::Walker;

/// Run find with `args` (program name excluded), returning the exit status.
///
/// Diagnostics go to `stderr` prefixed with `find: `.
pub fn run<O: Write, E: Write>(args: &[String], mut stdout: O, mut stderr: E) -> i32 {
    match find(args, &mut stdout, &mut stderr) {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(stderr, "find: {}", e);
            1
        }
    }
}

fn find<O: Write, E: Write>(args: &[String], stdout: &mut O, stderr: &mut E) -> Result<i32> {
    let registry = Registry::standard();

    let invocation = match cmdline::parse_args(args, &registry)? {
        Command::Help => {
            stdout.write_all(cmdline::help_text(&registry).as_bytes())?;
            stdout.flush()?;
            return Ok(0);
        }
        Command::Version => {
            stdout.write_all(cmdline::version_text().as_bytes())?;
            stdout.flush()?;
            return Ok(0);
        }
        Command::Find(invocation) => invocation,
    };

    let mut walker = Walker::new(&invocation.expr, invocation.policy, stdout, stderr);
    for path in &invocation.paths {
        walker.walk_root(path);
    }
    let summary = walker.finish()?;
    log::debug!("{:?}", summary);

    // per-entry failures were reported but don't change the status
    Ok(if summary.root_failures > 0 { 1 } else { 0 })
}
