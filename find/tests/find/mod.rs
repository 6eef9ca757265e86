//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use posixutils_find::cmdline::{self, Command as FindCommand};
use posixutils_find::expr::Expr;
use posixutils_find::registry::Registry;
use posixutils_find::walk::{SymlinkPolicy, Walker};

struct TestPlan {
    args: Vec<String>,
    expected_out: String,
    expected_err: String,
    expected_exit_code: i32,
}

fn run_find(args: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_find"))
        .args(args)
        .stdin(Stdio::null())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute find")
}

fn run_test(plan: TestPlan) {
    let output = run_find(&plan.args);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, plan.expected_out);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr, plan.expected_err);

    assert_eq!(output.status.code(), Some(plan.expected_exit_code));
}

fn run_test_find(args: &[&str], expected_out: &str, expected_err: &str, expected_exit_code: i32) {
    run_test(TestPlan {
        args: args.iter().map(|s| String::from(*s)).collect(),
        expected_out: String::from(expected_out),
        expected_err: String::from(expected_err),
        expected_exit_code,
    });
}

/// Run find and compare output lines after sorting, since directory order is
/// up to the file system.
fn run_test_find_sorted(
    args: &[&str],
    expected_lines: &[&str],
    expected_err: &str,
    expected_exit_code: i32,
) {
    let args: Vec<String> = args.iter().map(|s| String::from(*s)).collect();
    let output = run_find(&args);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut actual: Vec<&str> = stdout.lines().collect();
    actual.sort();
    let mut expected = expected_lines.to_vec();
    expected.sort();

    assert_eq!(actual, expected, "stdout mismatch (sorted comparison)");
    assert_eq!(String::from_utf8_lossy(&output.stderr), expected_err);
    assert_eq!(output.status.code(), Some(expected_exit_code));
}

/// A fresh, empty directory for one test.
fn fixture(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR"))
        .join("find")
        .join(name);
    if fs::symlink_metadata(&dir).is_ok() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, content: &str) {
    let mut file = File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn s(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

/// a.txt, b.TXT, c.rs and "file with space.txt"
fn names_fixture(name: &str) -> PathBuf {
    let dir = fixture(name);
    write_file(&dir.join("a.txt"), "alpha\n");
    write_file(&dir.join("b.TXT"), "");
    write_file(&dir.join("c.rs"), "fn main() {}\n");
    write_file(&dir.join("file with space.txt"), "");
    dir
}

#[test]
fn find_name_test() {
    let dir = names_fixture("name");
    let d = s(&dir);

    run_test_find_sorted(
        &[&d, "-name", "*.txt"],
        &[&format!("{d}/a.txt"), &format!("{d}/file with space.txt")],
        "",
        0,
    );
}

#[test]
fn find_iname_test() {
    let dir = names_fixture("iname");
    let d = s(&dir);

    run_test_find_sorted(
        &[&d, "-iname", "*.txt"],
        &[
            &format!("{d}/a.txt"),
            &format!("{d}/b.TXT"),
            &format!("{d}/file with space.txt"),
        ],
        "",
        0,
    );
}

#[test]
fn find_space_argument_test() {
    let dir = names_fixture("space");
    let d = s(&dir);

    run_test_find(
        &[&d, "-name", "file with space.txt"],
        &format!("{d}/file with space.txt\n"),
        "",
        0,
    );
}

#[test]
fn find_default_expression_test() {
    let dir = names_fixture("default");
    let d = s(&dir);

    run_test_find_sorted(
        &[&d],
        &[
            &d,
            &format!("{d}/a.txt"),
            &format!("{d}/b.TXT"),
            &format!("{d}/c.rs"),
            &format!("{d}/file with space.txt"),
        ],
        "",
        0,
    );
}

#[test]
fn find_root_name_is_matched_test() {
    let dir = names_fixture("rootname");
    let d = s(&dir);

    run_test_find(&[&d, "-name", "rootname"], &format!("{d}\n"), "", 0);
}

#[test]
fn find_not_test() {
    let dir = names_fixture("not");
    let d = s(&dir);

    run_test_find_sorted(
        &[&d, "!", "-name", "*.txt", "-a", "-not", "-name", "*.rs"],
        &[&d, &format!("{d}/b.TXT")],
        "",
        0,
    );
}

#[test]
fn find_or_test() {
    let dir = names_fixture("or");
    let d = s(&dir);

    run_test_find_sorted(
        &[&d, "-name", "*.rs", "-o", "-name", "a.*"],
        &[&format!("{d}/a.txt"), &format!("{d}/c.rs")],
        "",
        0,
    );
}

#[test]
fn find_print_then_test_test() {
    let dir = names_fixture("printfirst");
    let d = s(&dir);

    // the action runs before the test, so every file is printed once
    run_test_find_sorted(
        &[&d, "-print", "-name", "*.rs"],
        &[
            &d,
            &format!("{d}/a.txt"),
            &format!("{d}/b.TXT"),
            &format!("{d}/c.rs"),
            &format!("{d}/file with space.txt"),
        ],
        "",
        0,
    );
}

#[test]
fn find_combination_test() {
    let dir = names_fixture("combination");
    let d = s(&dir);

    run_test_find(
        &[&d, "-name", "c.rs", "-print", "-print"],
        &format!("{d}/c.rs\n{d}/c.rs\n"),
        "",
        0,
    );
}

#[test]
fn find_precedence_test() {
    let dir = fixture("precedence");
    write_file(&dir.join("a"), "data");
    write_file(&dir.join("b"), "");
    write_file(&dir.join("c"), "");
    let d = s(&dir);

    run_test_find(
        &[&d, "(", "-name", "a", "-o", "-name", "b", ")", "-a", "-empty"],
        &format!("{d}/b\n"),
        "",
        0,
    );
    run_test_find_sorted(
        &[&d, "-name", "a", "-o", "-name", "b", "-a", "-empty"],
        &[&format!("{d}/a"), &format!("{d}/b")],
        "",
        0,
    );
}

#[test]
fn find_empty_test() {
    let dir = fixture("empty");
    write_file(&dir.join("empty_file"), "");
    write_file(&dir.join("full_file"), "x");
    fs::create_dir(dir.join("empty_dir")).unwrap();
    fs::create_dir(dir.join("full_dir")).unwrap();
    write_file(&dir.join("full_dir/child"), "child");
    let d = s(&dir);

    run_test_find_sorted(
        &[&d, "-empty"],
        &[&format!("{d}/empty_file"), &format!("{d}/empty_dir")],
        "",
        0,
    );
}

#[test]
fn find_print0_test() {
    let dir = names_fixture("print0");
    let d = s(&dir);

    let args: Vec<String> = [d.as_str(), "-name", "*.txt", "-print0"]
        .iter()
        .map(|s| String::from(*s))
        .collect();
    let output = run_find(&args);

    assert!(output.stdout.ends_with(b"\0"));
    assert!(!output.stdout.contains(&b'\n'));
    let mut paths: Vec<&str> = output
        .stdout
        .split(|&b| b == 0)
        .filter_map(|bytes| std::str::from_utf8(bytes).ok())
        .filter(|s| !s.is_empty())
        .collect();
    paths.sort();

    assert_eq!(
        paths,
        vec![format!("{d}/a.txt"), format!("{d}/file with space.txt")]
    );
    assert!(output.stderr.is_empty());
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn find_symlink_loop_test() {
    let dir = fixture("loop");
    write_file(&dir.join("file"), "");
    symlink(&dir, dir.join("loop")).unwrap();
    let d = s(&dir);

    run_test_find_sorted(
        &["-L", &d],
        &[&d, &format!("{d}/file")],
        &format!(
            "find: File system loop detected; '{d}/loop' is part of the same file system loop as '{d}'.\n"
        ),
        0,
    );

    // without -L the link itself is reported and not followed
    run_test_find_sorted(
        &[&d],
        &[&d, &format!("{d}/file"), &format!("{d}/loop")],
        "",
        0,
    );
}

#[test]
fn find_symlink_loop_through_ancestor_test() {
    let dir = fixture("deeploop");
    fs::create_dir_all(dir.join("b/c")).unwrap();
    symlink(&dir, dir.join("b/c/up")).unwrap();
    let d = s(&dir);

    run_test_find_sorted(
        &["-L", &d],
        &[&d, &format!("{d}/b"), &format!("{d}/b/c")],
        &format!(
            "find: File system loop detected; '{d}/b/c/up' is part of the same file system loop as '{d}'.\n"
        ),
        0,
    );
}

#[test]
fn find_symlink_policies_test() {
    let dir = fixture("policies");
    let real = dir.join("real");
    fs::create_dir(&real).unwrap();
    write_file(&real.join("f"), "");
    symlink(&real, real.join("inner")).unwrap();
    let link = dir.join("link");
    symlink(&real, &link).unwrap();
    let l = s(&link);

    // -P: the root link is not followed
    run_test_find(&[&l], &format!("{l}\n"), "", 0);
    run_test_find(&["-L", "-P", &l], &format!("{l}\n"), "", 0);

    // -H: only the root link is followed
    run_test_find_sorted(
        &["-H", &l],
        &[&l, &format!("{l}/f"), &format!("{l}/inner")],
        "",
        0,
    );

    // -L: the inner link leads back to the root
    run_test_find_sorted(
        &["-L", &l],
        &[&l, &format!("{l}/f")],
        &format!(
            "find: File system loop detected; '{l}/inner' is part of the same file system loop as '{l}'.\n"
        ),
        0,
    );
}

#[test]
fn find_dangling_symlink_test() {
    let dir = fixture("dangling");
    symlink(dir.join("nowhere"), dir.join("broken")).unwrap();
    let d = s(&dir);

    run_test_find_sorted(&["-L", &d], &[&d, &format!("{d}/broken")], "", 0);
}

#[test]
fn find_missing_root_test() {
    let dir = names_fixture("missing");
    let d = s(&dir);
    let missing = format!("{d}/does-not-exist");

    // the remaining roots are still processed, but the status is 1
    run_test_find(
        &[&missing, &d, "-name", "c.rs"],
        &format!("{d}/c.rs\n"),
        &format!(
            "find: unable to get file {missing} information (No such file or directory (os error 2)).\n"
        ),
        1,
    );
}

fn run_find_into_full_device(dir: &Path) -> Output {
    let full = fs::OpenOptions::new().write(true).open("/dev/full").unwrap();
    Command::new(env!("CARGO_BIN_EXE_find"))
        .arg(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(full))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute find")
}

#[test]
fn find_write_error_test() {
    if !Path::new("/dev/full").exists() {
        return;
    }
    let expected_err = "find: write error: No space left on device (os error 28)\n";

    // fails on the final flush
    let dir = names_fixture("full_small");
    let output = run_find_into_full_device(&dir);
    assert_eq!(String::from_utf8_lossy(&output.stderr), expected_err);
    assert_eq!(output.status.code(), Some(1));

    // fails in the middle of the walk, and is reported only once
    let dir = fixture("full_large");
    for i in 0..2000 {
        write_file(&dir.join(format!("file-with-a-rather-long-name-{i:05}")), "");
    }
    let output = run_find_into_full_device(&dir);
    assert_eq!(String::from_utf8_lossy(&output.stderr), expected_err);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn find_parse_error_test() {
    let dir = names_fixture("parse");
    let d = s(&dir);

    run_test_find(&[&d, "-bogus"], "", "find: invalid expression -bogus\n", 1);
    run_test_find(
        &[&d, "-name"],
        "",
        "find: missing argument for -name test.\n",
        1,
    );
    run_test_find(
        &[&d, "-print", "extra"],
        "",
        "find: invalid argument for -print action.\n",
        1,
    );
    run_test_find(
        &[&d, "(", "-empty"],
        "",
        "find: missing closing parenthesis\n",
        1,
    );
    run_test_find(
        &[&d, "-empty", ")"],
        "",
        "find: unexpected `)' without matching `('\n",
        1,
    );
}

#[test]
fn find_long_options_test() {
    let output = run_find(&[String::from("--help")]);
    assert_eq!(output.status.code(), Some(0));
    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.starts_with("Usage: find [-H] [-L] [-P] [path...] [expression]\n"));
    assert!(help.contains("    -iname PATTERN\n"));

    let output = run_find(&[String::from("--version")]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("posixutils-find "));

    run_test_find(&["--bogus"], "", "find: unknown option --bogus\n", 1);
}

/// Walk `root` with `expr` in-process and return the sorted output lines.
fn walk_lines(expr: &Expr, root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut walker = Walker::new(expr, SymlinkPolicy::Never, &mut out, &mut err);
    walker.walk_root(root);
    let summary = walker.finish().unwrap();
    assert_eq!(summary.root_failures, 0);
    assert!(err.is_empty());

    let mut lines: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    lines.sort();
    lines
}

#[test]
fn find_parsed_tree_matches_manual_tree() {
    let dir = fixture("manual");
    fs::create_dir(dir.join("x")).unwrap();
    fs::create_dir(dir.join("y")).unwrap();
    write_file(&dir.join("x/a"), "");
    write_file(&dir.join("y/a"), "not empty");
    write_file(&dir.join("y/b"), "");

    let reg = Registry::standard();
    let args: Vec<String> = ["(", "-name", "a", "-o", "-name", "b", ")", "-a", "-empty"]
        .iter()
        .map(|s| String::from(*s))
        .collect();
    let parsed = match cmdline::parse_args(&args, &reg).unwrap() {
        FindCommand::Find(invocation) => invocation.expr,
        other => panic!("unexpected {:?}", other),
    };

    let name = |pattern: &str| Expr::new_test(reg.test("name").unwrap(), Some(pattern)).unwrap();
    let manual = Expr::and(
        Expr::and(
            Expr::or(name("a"), name("b")),
            Expr::new_test(reg.test("empty").unwrap(), None).unwrap(),
        ),
        Expr::new_action(reg.action("print").unwrap(), None).unwrap(),
    );
    assert_eq!(parsed.node_count(), manual.node_count());

    let d = s(&dir);
    let expected = vec![format!("{d}/x/a"), format!("{d}/y/b")];
    assert_eq!(walk_lines(&parsed, &dir), expected);
    assert_eq!(walk_lines(&manual, &dir), expected);

    // the empty `a` matches, the non-empty one does not
    assert_eq!(walk_lines(&manual, &dir.join("x/a")), vec![format!("{d}/x/a")]);
    assert!(walk_lines(&manual, &dir.join("y/a")).is_empty());
}

#[test]
fn find_run_in_process() {
    let dir = names_fixture("inprocess");
    let d = s(&dir);

    let args = vec![d.clone(), String::from("-name"), String::from("c.rs")];
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = posixutils_find::run(&args, &mut out, &mut err);

    assert_eq!(code, 0);
    assert_eq!(String::from_utf8(out).unwrap(), format!("{d}/c.rs\n"));
    assert!(err.is_empty());
}
