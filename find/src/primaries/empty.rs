//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fs;

use crate::registry::{FileInfo, Predicate};

pub const HELP: &str = "    -empty
           The file is empty.
";

/// True for a zero-length file or a directory without entries.
#[derive(Debug)]
pub struct Empty;

impl Predicate for Empty {
    fn test(&self, file: &FileInfo) -> bool {
        if file.metadata.is_dir() {
            // a directory always has some size; it is empty when it lists nothing
            match fs::read_dir(file.path) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) => {
                    log::debug!("-empty: cannot read {}: {}", file.path.display(), e);
                    false
                }
            }
        } else {
            file.metadata.len() == 0
        }
    }
}

pub fn build(_arg: Option<&str>) -> Result<Box<dyn Predicate>, String> {
    Ok(Box::new(Empty))
}
