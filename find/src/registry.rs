//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Tables of the tests and actions that may appear in an expression.
//!
//! A terminal is looked up by its name without the leading `-`. Adding a new
//! one means implementing [`Predicate`] or [`Effect`] and appending a
//! descriptor row to [`Registry::standard`].

use std::ffi::OsStr;
use std::fmt;
use std::fs::Metadata;
use std::io::{self, Write};
use std::path::Path;

use crate::primaries;

/// Hint about whether a terminal takes an argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    None,
    Optional,
    Mandatory,
}

/// Whether a terminal is a test or an action, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalKind {
    Test,
    Action,
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalKind::Test => f.write_str("test"),
            TerminalKind::Action => f.write_str("action"),
        }
    }
}

/// The file an expression is being evaluated against.
pub struct FileInfo<'a> {
    /// Path as built by the walk (root path joined with entry names)
    pub path: &'a Path,
    /// Last component of `path`
    pub name: &'a OsStr,
    /// Metadata resolved according to the symlink policy
    pub metadata: &'a Metadata,
}

/// A test: a side-effect free predicate on a file.
pub trait Predicate: fmt::Debug {
    fn test(&self, file: &FileInfo) -> bool;
}

/// An action: an effect performed for a file, writing to `out`.
pub trait Effect: fmt::Debug {
    fn perform(&self, path: &Path, out: &mut dyn Write) -> io::Result<()>;
}

pub type PredicateBuilder = fn(Option<&str>) -> Result<Box<dyn Predicate>, String>;
pub type EffectBuilder = fn(Option<&str>) -> Result<Box<dyn Effect>, String>;

#[derive(Clone, Copy)]
pub struct TestDescriptor {
    pub id: &'static str,
    pub arity: Arity,
    pub help: &'static str,
    pub build: PredicateBuilder,
}

#[derive(Clone, Copy)]
pub struct ActionDescriptor {
    pub id: &'static str,
    pub arity: Arity,
    pub help: &'static str,
    pub build: EffectBuilder,
}

impl fmt::Debug for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDescriptor")
            .field("id", &self.id)
            .field("arity", &self.arity)
            .finish()
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("id", &self.id)
            .field("arity", &self.arity)
            .finish()
    }
}

/// The closed set of terminals known to the parser.
#[derive(Clone, Debug)]
pub struct Registry {
    tests: Vec<TestDescriptor>,
    actions: Vec<ActionDescriptor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Registry {
    /// A registry without any terminal.
    pub fn empty() -> Self {
        Self {
            tests: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// The built-in tests and actions.
    pub fn standard() -> Self {
        Self::empty()
            .with_test(TestDescriptor {
                id: "empty",
                arity: Arity::None,
                help: primaries::empty::HELP,
                build: primaries::empty::build,
            })
            .with_test(TestDescriptor {
                id: "iname",
                arity: Arity::Mandatory,
                help: primaries::name::INAME_HELP,
                build: primaries::name::build_iname,
            })
            .with_test(TestDescriptor {
                id: "name",
                arity: Arity::Mandatory,
                help: primaries::name::NAME_HELP,
                build: primaries::name::build_name,
            })
            .with_action(ActionDescriptor {
                id: "print0",
                arity: Arity::None,
                help: primaries::print::PRINT0_HELP,
                build: primaries::print::build_print0,
            })
            .with_action(ActionDescriptor {
                id: "print",
                arity: Arity::None,
                help: primaries::print::PRINT_HELP,
                build: primaries::print::build_print,
            })
    }

    pub fn with_test(mut self, descriptor: TestDescriptor) -> Self {
        self.tests.push(descriptor);
        self
    }

    pub fn with_action(mut self, descriptor: ActionDescriptor) -> Self {
        self.actions.push(descriptor);
        self
    }

    pub fn test(&self, id: &str) -> Option<&TestDescriptor> {
        self.tests.iter().find(|d| d.id == id)
    }

    pub fn action(&self, id: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|d| d.id == id)
    }

    pub fn tests(&self) -> &[TestDescriptor] {
        &self.tests
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// Descriptor of the action injected when an expression has none.
    pub fn default_action(&self) -> ActionDescriptor {
        match self.action("print") {
            Some(d) => *d,
            None => ActionDescriptor {
                id: "print",
                arity: Arity::None,
                help: primaries::print::PRINT_HELP,
                build: primaries::print::build_print,
            },
        }
    }
}
