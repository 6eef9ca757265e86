//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! `-name` and `-iname`: shell glob matching on the last path component.

use regex::{Regex, RegexBuilder};

use crate::registry::{FileInfo, Predicate};

pub const NAME_HELP: &str = "    -name PATTERN
           Filter files by their name matching the shell PATTERN. Only the name
           is matched, not the directory. The metacharacters include `*', `?',
           and `[]'.  Don't forget to enclose the pattern in quotes in order to
           protect it from expansion by the shell.
";

pub const INAME_HELP: &str = "    -iname PATTERN
           Same as -name, but the match is case insensitive.
";

#[derive(Debug)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self, String> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(ignore_case)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| format!("invalid pattern: {}", e))?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl Predicate for NamePattern {
    fn test(&self, file: &FileInfo) -> bool {
        self.is_match(&file.name.to_string_lossy())
    }
}

pub fn build_name(arg: Option<&str>) -> Result<Box<dyn Predicate>, String> {
    let pattern = arg.ok_or_else(|| String::from("missing pattern"))?;
    Ok(Box::new(NamePattern::new(pattern, false)?))
}

pub fn build_iname(arg: Option<&str>) -> Result<Box<dyn Predicate>, String> {
    let pattern = arg.ok_or_else(|| String::from("missing pattern"))?;
    Ok(Box::new(NamePattern::new(pattern, true)?))
}

/// Translate a shell glob into an anchored regular expression.
///
/// `*` and `?` match any character including a leading `.`, a `[` without
/// a closing `]` is literal, and `\` quotes the following character.
/// Bracket expressions accept `[:class:]`, `[=c=]` and `[.c.]` elements.
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::from("^");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => match bracket_end(&chars, i) {
                Some(end) => {
                    push_class(&mut re, &chars[i + 1..end]);
                    i = end;
                }
                None => re.push_str(r"\["),
            },
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut re, chars[i]);
            }
            c => push_literal(&mut re, c),
        }
        i += 1;
    }

    re.push('$');
    re
}

/// Index of the `]` closing the bracket expression opened at `start`.
fn bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if matches!(chars.get(j), Some('!') | Some('^')) {
        j += 1;
    }
    // a `]` right after the opening bracket is a member, not the end
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() {
        match chars[j] {
            ']' => return Some(j),
            '[' => j += bracket_element_len(chars, j).unwrap_or(1),
            _ => j += 1,
        }
    }
    None
}

/// Length of a `[:class:]`, `[=c=]` or `[.c.]` element starting at `i`.
fn bracket_element_len(chars: &[char], i: usize) -> Option<usize> {
    if chars.get(i) != Some(&'[') {
        return None;
    }
    let delim = match chars.get(i + 1) {
        Some(&d @ (':' | '=' | '.')) => d,
        _ => return None,
    };
    (i + 2..chars.len().saturating_sub(1))
        .find(|&j| chars[j] == delim && chars[j + 1] == ']')
        .map(|j| j + 2 - i)
}

fn push_class(re: &mut String, body: &[char]) {
    re.push('[');
    let body = match body.first() {
        Some('!') | Some('^') => {
            re.push('^');
            &body[1..]
        }
        _ => body,
    };

    let mut k = 0;
    while k < body.len() {
        match bracket_element_len(body, k) {
            Some(len) => {
                let inner = &body[k + 2..k + len - 2];
                if body[k + 1] == ':' {
                    // the regex syntax for character classes is the same
                    re.push_str("[:");
                    re.extend(inner);
                    re.push_str(":]");
                } else {
                    // equivalence classes and collating symbols stand for
                    // their own characters
                    for &c in inner {
                        if c == '-' {
                            re.push('\\');
                        }
                        push_class_member(re, c);
                    }
                }
                k += len;
            }
            None => {
                push_class_member(re, body[k]);
                k += 1;
            }
        }
    }
    re.push(']');
}

fn push_class_member(re: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '&' | '~' | '^') {
        re.push('\\');
    }
    re.push(c);
}

fn push_literal(re: &mut String, c: char) {
    let mut buf = [0u8; 4];
    re.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
