// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use std::{fmt, net::Ipv4Addr, str::FromStr};

/// an ipv4 address packed into a single integer, first octet most significant
///
/// this doubles as the index of the address' counter, every `u32` is a valid key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressKey(u32);

impl AddressKey {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn from_octets(octets: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(octets))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<Ipv4Addr> for AddressKey {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr.to_bits())
    }
}

impl From<AddressKey> for Ipv4Addr {
    fn from(key: AddressKey) -> Self {
        Self::from_bits(key.0)
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Ipv4Addr::from(*self), f)
    }
}

impl FromStr for AddressKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// the broad reason a line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// wrong shape, or a field that is not a number
    Format,
    /// a number that does not fit in an octet
    Range,
}

#[derive(Debug, PartialEq, Eq, foxerror::FoxError)]
pub enum Error {
    /// expected four dot separated fields
    FieldCount(String),
    /// not a number
    NotANumber(String),
    /// octet is out of range
    OutOfRange(String),
    /// not utf-8
    NotText(String),
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldCount(_) | Self::NotANumber(_) | Self::NotText(_) => ErrorKind::Format,
            Self::OutOfRange(_) => ErrorKind::Range,
        }
    }
}

fn parse_octet(field: &str) -> Result<u8, Error> {
    // signed so that "-1" is reported as out of range rather than as garbage
    let value: i64 = field
        .parse()
        .map_err(|_| Error::NotANumber(field.to_string()))?;
    u8::try_from(value).map_err(|_| Error::OutOfRange(field.to_string()))
}

/// parse a dotted quad such as `192.168.1.1` into its key
///
/// # Errors
///
/// fails with a [`ErrorKind::Format`] error when the line does not have exactly
/// four fields or a field is not a decimal integer, and with [`ErrorKind::Range`]
/// when a field is an integer outside `0..=255`
pub fn parse(line: &str) -> Result<AddressKey, Error> {
    if line.bytes().filter(|&b| b == b'.').count() != 3 {
        return Err(Error::FieldCount(line.to_string()));
    }

    let mut octets = [0; 4];
    for (octet, field) in octets.iter_mut().zip(line.split('.')) {
        *octet = parse_octet(field)?;
    }
    Ok(AddressKey::from_octets(octets))
}

#[test]
fn test_parse() {
    assert_eq!(parse("0.0.0.0"), Ok(AddressKey::new(0)));
    assert_eq!(parse("255.255.255.255"), Ok(AddressKey::new(u32::MAX)));
    assert_eq!(parse("1.2.3.4"), Ok(AddressKey::new(0x0102_0304)));
    assert_eq!(parse("192.168.001.010"), Ok(AddressKey::new(0xc0a8_010a)));
    assert_eq!(parse("+10.0.0.1"), Ok(AddressKey::new(0x0a00_0001)));
}

#[test]
fn test_octets_survive() {
    let base = [10, 20, 30, 40];
    for position in 0..4 {
        for value in 0..=255 {
            let mut quad = base;
            quad[position] = value;
            let line = format!("{}.{}.{}.{}", quad[0], quad[1], quad[2], quad[3]);
            let key = parse(&line).unwrap();
            assert_eq!(key.octets(), quad, "{line}");
            assert_eq!(key.to_string(), line);
            assert_eq!(Ipv4Addr::from(key), line.parse::<Ipv4Addr>().unwrap());
        }
    }
    assert_eq!(parse("255.255.255.255").unwrap().octets(), [255; 4]);
}

#[test]
fn test_format_errors() {
    for line in ["1.2.3", "1.2.3.4.5", "", "1..3.4", "1.2.3.4.", "1.2.3.x", " 1.2.3.4"] {
        let err = parse(line).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "{line:?} gave {err}");
    }
    assert_eq!(
        parse("1.2.3.x"),
        Err(Error::NotANumber("x".to_string()))
    );
    assert_eq!(
        parse("1.2.x").unwrap_err(),
        Error::FieldCount("1.2.x".to_string())
    );
    assert_eq!(
        parse("1.2.3.99999999999999999999").unwrap_err().kind(),
        ErrorKind::Format
    );
}

#[test]
fn test_range_errors() {
    for line in ["1.2.3.256", "-1.2.3.4", "1.1000.3.4"] {
        let err = parse(line).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range, "{line:?} gave {err}");
    }
    assert_eq!(
        parse("1.2.3.256").unwrap_err().to_string(),
        "octet is out of range: 256"
    );
}
