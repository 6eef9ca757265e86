//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Depth-first directory traversal.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::error::WalkError;
use crate::expr::{Expr, Sink};
use crate::registry::FileInfo;

/// Symlink following mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymlinkPolicy {
    /// -P: never follow symlinks
    #[default]
    Never,
    /// -H: follow symlinks given on the command line only
    CommandLine,
    /// -L: always follow symlinks
    Always,
}

/// Get metadata for a path, following symlinks according to `policy`.
///
/// A followed link whose target can't be reached (dangling, or a loop of
/// links) is described by its own metadata.
pub fn resolve_metadata(path: &Path, policy: SymlinkPolicy, is_root: bool) -> io::Result<Metadata> {
    let follow = match policy {
        SymlinkPolicy::Never => false,
        SymlinkPolicy::CommandLine => is_root,
        SymlinkPolicy::Always => true,
    };

    if follow {
        match fs::metadata(path) {
            Ok(m) => Ok(m),
            Err(e) => fs::symlink_metadata(path).map_err(|_| e),
        }
    } else {
        fs::symlink_metadata(path)
    }
}

/// Last component of a path, as `basename` would print it.
pub fn base_name(path: &Path) -> &OsStr {
    path.components()
        .next_back()
        .map(|c| c.as_os_str())
        .unwrap_or_else(|| path.as_os_str())
}

#[derive(Debug)]
struct Ancestor {
    dev: u64,
    ino: u64,
    path: PathBuf,
}

/// Directories currently being descended, innermost last.
#[derive(Debug, Default)]
pub struct DirStack {
    entries: Vec<Ancestor>,
}

impl DirStack {
    pub fn push(&mut self, path: &Path, metadata: &Metadata) {
        self.entries.push(Ancestor {
            dev: metadata.dev(),
            ino: metadata.ino(),
            path: path.to_path_buf(),
        });
    }

    pub fn pop(&mut self) {
        self.entries.pop();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ancestor that is the same file as `metadata`, searching the whole
    /// stack from the innermost directory outwards.
    pub fn find(&self, metadata: &Metadata) -> Option<&Path> {
        let (dev, ino) = (metadata.dev(), metadata.ino());
        self.entries
            .iter()
            .rev()
            .find(|a| a.dev == dev && a.ino == ino)
            .map(|a| a.path.as_path())
    }
}

/// Outcome of a finished walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Paths from the command line that could not be stat'ed or opened
    pub root_failures: usize,
}

/// Evaluates an expression against every file below a set of roots.
pub struct Walker<'a> {
    expr: &'a Expr,
    policy: SymlinkPolicy,
    stack: DirStack,
    sink: Sink<'a>,
    err: &'a mut dyn Write,
    summary: Summary,
    /// Standard output failed; nothing more can be written
    halted: bool,
    /// The write error that halted the walk, unless it was a closed pipe
    output_error: Option<io::Error>,
}

impl<'a> Walker<'a> {
    pub fn new(
        expr: &'a Expr,
        policy: SymlinkPolicy,
        out: &'a mut dyn Write,
        err: &'a mut dyn Write,
    ) -> Self {
        Self {
            expr,
            policy,
            stack: DirStack::default(),
            sink: Sink::new(out),
            err,
            summary: Summary::default(),
            halted: false,
            output_error: None,
        }
    }

    /// Process one path given on the command line, and everything below it.
    pub fn walk_root(&mut self, root: &Path) {
        if self.halted {
            return;
        }
        log::debug!("walking {} ({:?})", root.display(), self.policy);

        let metadata = match resolve_metadata(root, self.policy, true) {
            Ok(m) => m,
            Err(source) => {
                let path = root.to_path_buf();
                self.report(WalkError::Stat { path, source }, true);
                return;
            }
        };

        self.visit(root, base_name(root), &metadata);
        if metadata.is_dir() {
            self.descend(root, &metadata, true);
        }
        debug_assert!(self.stack.is_empty());
    }

    /// Flush the output and return the summary.
    ///
    /// Fails with the first write error on the output, other than a closed
    /// pipe.
    pub fn finish(mut self) -> Result<Summary, WalkError> {
        if !self.halted {
            if let Err(e) = self.sink.flush() {
                self.halt(e);
            }
        }
        match self.output_error {
            Some(e) => Err(WalkError::Output(e)),
            None => Ok(self.summary),
        }
    }

    /// Stop the walk after a failed write.
    fn halt(&mut self, error: io::Error) {
        if error.kind() == io::ErrorKind::BrokenPipe {
            log::debug!("output closed, stopping");
        } else {
            log::debug!("write failed, stopping: {}", error);
            self.output_error = Some(error);
        }
        self.halted = true;
    }

    fn visit(&mut self, path: &Path, name: &OsStr, metadata: &Metadata) {
        let file = FileInfo {
            path,
            name,
            metadata,
        };
        let matched = self.expr.evaluate(&file, &mut self.sink);
        log::trace!("{}: {}", path.display(), matched);

        if let Some(e) = self.sink.take_error() {
            self.halt(e);
        }
    }

    fn descend(&mut self, dir: &Path, metadata: &Metadata, is_root: bool) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(source) => {
                let path = dir.to_path_buf();
                self.report(WalkError::OpenDir { path, source }, is_root);
                return;
            }
        };

        self.stack.push(dir, metadata);

        for entry in entries {
            if self.halted {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let path = dir.to_path_buf();
                    self.report(WalkError::ReadDir { path, source }, false);
                    // the stream is not usable after an error
                    break;
                }
            };

            let path = entry.path();
            let metadata = match resolve_metadata(&path, self.policy, false) {
                Ok(m) => m,
                Err(source) => {
                    self.report(WalkError::Stat { path, source }, false);
                    continue;
                }
            };

            if let Some(ancestor) = self.stack.find(&metadata).map(Path::to_path_buf) {
                self.report(WalkError::Loop { path, ancestor }, false);
                continue;
            }

            self.visit(&path, &entry.file_name(), &metadata);
            if metadata.is_dir() {
                self.descend(&path, &metadata, false);
            }
        }

        self.stack.pop();
    }

    fn report(&mut self, error: WalkError, at_root: bool) {
        log::debug!("skipping: {:?}", error);
        let _ = writeln!(self.err, "find: {}", error);
        if at_root {
            self.summary.root_failures += 1;
        }
    }
}
