//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::registry::Effect;

pub const PRINT_HELP: &str = "    -print
           Print the full file name on the standard output, followed by a
           newline. This is the default action when no action is specified.
";

pub const PRINT0_HELP: &str = "    -print0
           Print the full file name on the standard output followed by a null
           character.
";

/// Write the path followed by `terminator`.
#[derive(Debug)]
pub struct Print {
    terminator: u8,
}

impl Print {
    pub fn newline() -> Self {
        Self { terminator: b'\n' }
    }

    pub fn nul() -> Self {
        Self { terminator: b'\0' }
    }
}

impl Effect for Print {
    fn perform(&self, path: &Path, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(path.as_os_str().as_bytes())?;
        out.write_all(&[self.terminator])
    }
}

pub fn build_print(_arg: Option<&str>) -> Result<Box<dyn Effect>, String> {
    Ok(Box::new(Print::newline()))
}

pub fn build_print0(_arg: Option<&str>) -> Result<Box<dyn Effect>, String> {
    Ok(Box::new(Print::nul()))
}
