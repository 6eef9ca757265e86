//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io::{self, BufWriter};

use gettextrs::{bind_textdomain_codeset, setlocale, textdomain, LocaleCategory};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setlocale(LocaleCategory::LcAll, "");
    textdomain("posixutils-rs")?;
    bind_textdomain_codeset("posixutils-rs", "UTF-8")?;
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let stdout = io::stdout();
    let code = posixutils_find::run(&args, BufWriter::new(stdout.lock()), io::stderr());
    std::process::exit(code)
}
