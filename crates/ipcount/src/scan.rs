// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use crate::{
    counter::{SaturatingPresenceCounter, Slot},
    parse::{self, AddressKey},
};
use log::{debug, warn};
use std::io::BufRead;

/// where in the input a bad line was
#[derive(Debug, PartialEq, Eq)]
pub struct LineContext {
    line: u64,
    text: String,
}

impl LineContext {
    #[must_use]
    pub const fn line(&self) -> u64 {
        self.line
    }
}

impl std::fmt::Display for LineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "on line {} ({:?})", self.line, self.text)
    }
}

#[derive(Debug, foxerror::FoxError)]
pub enum Error {
    /// could not read input
    #[err(from)]
    Read(std::io::Error),
    /// invalid address
    Parse(LineContext, parse::Error),
}

/// what to do with a line that is not an address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    /// give up on the whole input
    #[default]
    FailFast,
    /// leave it out and keep going
    Skip,
}

/// what happened while reading an input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// every line read, skipped ones included
    pub lines: u64,
    pub skipped: u64,
}

/// the lines in one chunk read up to `\n`
///
/// `\r` ends a line too, on its own or in front of `\n`
fn split_lines(chunk: &[u8]) -> impl Iterator<Item = &[u8]> {
    let chunk = chunk.strip_suffix(b"\n").unwrap_or(chunk);
    let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    chunk.split(|&b| b == b'\r')
}

fn parse_line(line: &[u8]) -> Result<AddressKey, parse::Error> {
    let text = str::from_utf8(line)
        .map_err(|_| parse::Error::NotText(String::from_utf8_lossy(line).into_owned()))?;
    parse::parse(text)
}

/// feed every line of `reader` into `counter`
///
/// `on_line` gets the number of lines consumed so far after each one.
///
/// # Errors
///
/// returns [`Error::Read`] if reading fails, and [`Error::Parse`] for the first
/// bad line when `policy` is [`Policy::FailFast`]. either way the counter holds
/// a partial result that should not be reported.
pub fn ingest<R: BufRead>(
    mut reader: R,
    counter: &mut SaturatingPresenceCounter,
    policy: Policy,
    mut on_line: impl FnMut(u64),
) -> Result<Summary, Error> {
    let mut summary = Summary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        for line in split_lines(&buf) {
            summary.lines += 1;
            match parse_line(line) {
                Ok(key) => counter.observe(key),
                Err(e) if policy == Policy::Skip => {
                    debug!("skipping line {}: {e}", summary.lines);
                    summary.skipped += 1;
                }
                Err(e) => {
                    let context = LineContext {
                        line: summary.lines,
                        text: String::from_utf8_lossy(line).into_owned(),
                    };
                    return Err(Error::Parse(context, e));
                }
            }

            on_line(summary.lines);
        }
    }

    if summary.skipped > 0 {
        warn!(
            "skipped {} of {} lines that were not addresses",
            summary.skipped, summary.lines
        );
    }
    Ok(summary)
}

/// count the addresses that show up exactly once in `reader`
///
/// # Errors
///
/// same as [`ingest`]
pub fn count_unique<R: BufRead>(reader: R, policy: Policy) -> Result<u64, Error> {
    let mut counter = SaturatingPresenceCounter::new();
    ingest(reader, &mut counter, policy, |_| ())?;
    Ok(counter.count_value(Slot::SeenOnce))
}

#[test]
fn test_split_lines() {
    fn lines(chunk: &[u8]) -> Vec<&[u8]> {
        split_lines(chunk).collect()
    }
    assert_eq!(lines(b"1.2.3.4\n"), [b"1.2.3.4"]);
    assert_eq!(lines(b"1.2.3.4\r\n"), [b"1.2.3.4"]);
    assert_eq!(lines(b"1.2.3.4"), [b"1.2.3.4"]);
    assert_eq!(lines(b"1.2.3.4\r"), [b"1.2.3.4"]);
    assert_eq!(lines(b"\n"), [b""]);
    assert_eq!(lines(b"1.1.1.1\r2.2.2.2\r\n"), [&b"1.1.1.1"[..], b"2.2.2.2"]);
    assert_eq!(lines(b"1.1.1.1\r\r2.2.2.2\n"), [&b"1.1.1.1"[..], b"", b"2.2.2.2"]);
}

#[test]
fn test_count_unique() {
    let dupes = "1.1.1.1\n1.1.1.1\n2.2.2.2\n";
    assert_eq!(count_unique(dupes.as_bytes(), Policy::FailFast).unwrap(), 1);

    let distinct = "10.0.0.1\r\n10.0.0.2\r\n10.0.0.3";
    assert_eq!(count_unique(distinct.as_bytes(), Policy::FailFast).unwrap(), 3);

    assert_eq!(count_unique(&b""[..], Policy::FailFast).unwrap(), 0);
}

#[test]
fn test_fail_fast() {
    let input = "1.1.1.1\n1.2.3.x\n2.2.2.2\n";
    let Err(Error::Parse(context, e)) = count_unique(input.as_bytes(), Policy::FailFast) else {
        panic!("bad line was accepted");
    };
    assert_eq!(context.line(), 2);
    assert_eq!(e, parse::Error::NotANumber("x".to_string()));
    assert_eq!(
        Error::Parse(context, e).to_string(),
        r#"invalid address: on line 2 ("1.2.3.x"), not a number: x"#
    );

    let blank = "1.1.1.1\n\n2.2.2.2\n";
    assert!(matches!(
        count_unique(blank.as_bytes(), Policy::FailFast),
        Err(Error::Parse(_, parse::Error::FieldCount(_)))
    ));
}

#[test]
fn test_skip_policy() {
    let input = "1.1.1.1\n300.1.1.1\n\n2.2.2.2\n1.1.1.1\n3.3.3.3\n";
    let mut counter = SaturatingPresenceCounter::new();
    let mut progress = vec![];
    let summary = ingest(input.as_bytes(), &mut counter, Policy::Skip, |n| {
        progress.push(n);
    })
    .unwrap();
    assert_eq!(
        summary,
        Summary {
            lines: 6,
            skipped: 2
        }
    );
    assert_eq!(progress, [1, 2, 3, 4, 5, 6]);
    assert_eq!(counter.count_value(Slot::SeenOnce), 2);
    assert_eq!(counter.count_value(Slot::SeenMany), 1);
}

#[test]
fn test_carriage_returns() {
    let input = "1.1.1.1\r2.2.2.2\r\n1.1.1.1\r3.3.3.3";
    let mut counter = SaturatingPresenceCounter::new();
    let summary = ingest(input.as_bytes(), &mut counter, Policy::FailFast, |_| ()).unwrap();
    assert_eq!(summary.lines, 4);
    assert_eq!(counter.count_value(Slot::SeenOnce), 2);
    assert_eq!(counter.count_value(Slot::SeenMany), 1);
}

#[test]
fn test_not_utf8() {
    let input: &[u8] = b"1.1.1.1\n\xff.2.3.4\n2.2.2.2\n";
    let Err(Error::Parse(context, e)) = count_unique(input, Policy::FailFast) else {
        panic!("bad line was accepted");
    };
    assert_eq!(context.line(), 2);
    assert_eq!(e.kind(), parse::ErrorKind::Format);
    let message = Error::Parse(context, e).to_string();
    assert!(message.contains("on line 2"), "{message}");
    assert!(message.contains("not utf-8: \u{fffd}.2.3.4"), "{message}");

    assert_eq!(count_unique(input, Policy::Skip).unwrap(), 2);
}

#[cfg(test)]
struct Broken;

#[cfg(test)]
impl std::io::Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk on fire"))
    }
}

#[test]
fn test_read_error() {
    let input = std::io::Read::chain("1.1.1.1\n".as_bytes(), Broken);
    let reader = std::io::BufReader::new(input);
    let Err(Error::Read(e)) = count_unique(reader, Policy::Skip) else {
        panic!("read error was swallowed");
    };
    assert_eq!(e.to_string(), "disk on fire");
}
