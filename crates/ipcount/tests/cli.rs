// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    ffi::OsStr,
    io::Write,
    process::{Command, Output, Stdio},
};

static BIN: &str = env!("CARGO_BIN_EXE_ipcount");
static DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/");

fn command_output(args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Output {
    Command::new(BIN).args(args).output().unwrap()
}

fn count(name: &str, extra: &[&str]) -> Output {
    let path = format!("{DATA_DIR}{name}.txt");
    command_output(extra.iter().copied().chain([path.as_str()]))
}

fn test_count(name: &str, extra: &[&str], expected: u64) {
    let output = count(name, extra);
    dbg!(str::from_utf8(&output.stderr).unwrap());
    assert!(output.status.success());
    assert_eq!(
        str::from_utf8(&output.stdout).unwrap(),
        format!("{expected}\n")
    );
}

#[test]
fn dupes() {
    test_count("dupes", &[], 1);
}

#[test]
fn distinct() {
    test_count("distinct", &[], 3);
}

#[test]
fn empty() {
    test_count("empty", &[], 0);
}

#[test]
fn count_many() {
    test_count("dupes", &["--count", "many"], 1);
}

#[test]
fn progress() {
    let output = count("distinct", &[]);
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("reading approx. 1 addresses\n"));
    assert!(stderr.contains("100% done\n"));
    assert!(stderr.ends_with("counting...\n"));

    let output = count("distinct", &["-q"]);
    assert!(output.status.success());
    assert!(output.stderr.is_empty());
}

#[test]
fn bad_line_fails() {
    let output = count("bad", &["-q"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("on line 2"), "{stderr}");
    assert!(stderr.contains("not a number: x"), "{stderr}");

    let output = count("mixed", &["-q"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("octet is out of range: 256"), "{stderr}");
}

#[test]
fn skip_invalid() {
    test_count("bad", &["--skip-invalid"], 2);
    test_count("mixed", &["-s"], 2);
}

#[test]
fn missing_file() {
    let output = command_output(["-q", concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/nope")]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("could not open input: "), "{stderr}");
    assert!(stderr.contains("nope"), "{stderr}");
}

#[test]
fn stdin() {
    let mut child = Command::new(BIN)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"4.4.4.4\n5.5.5.5\n4.4.4.4\n6.6.6.6\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, b"2\n");
}

#[test]
fn garbled_bytes() {
    let output = count("garbled", &["-q"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("on line 2"), "{stderr}");
    assert!(stderr.contains("not utf-8"), "{stderr}");

    // a lone carriage return ends a line too
    test_count("garbled", &["-s"], 3);
}
