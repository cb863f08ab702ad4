//! Build stamp reported by the `status` tool and the startup banner.
//!
//! `build.rs` exports `KJ_BUILD_NUMBER` and `KJ_BUILD_TIMESTAMP`; both fall
//! back to harmless defaults when the crate is built without it.

use serde::Serialize;
use std::fmt;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const BUILD_NUMBER: u64 = match option_env!("KJ_BUILD_NUMBER") {
    Some(s) => digits(s),
    None => 0,
};

const BUILD_TIMESTAMP: &str = match option_env!("KJ_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Decimal digits to a number; anything malformed counts as build 0
const fn digits(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut n: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            return 0;
        }
        n = n.saturating_mul(10).saturating_add((bytes[i] - b'0') as u64);
        i += 1;
    }
    n
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildStamp {
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildStamp {
    pub const CURRENT: BuildStamp = BuildStamp {
        version: VERSION,
        build_number: BUILD_NUMBER,
        build_timestamp: BUILD_TIMESTAMP,
    };
}

impl fmt::Display for BuildStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kilojoules {} (build {}, {})",
            self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Startup line on stderr; stdout carries the MCP transport
pub fn print_startup_banner() {
    eprintln!("{}", BuildStamp::CURRENT);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits() {
        assert_eq!(digits("42"), 42);
        assert_eq!(digits(""), 0);
        assert_eq!(digits("4x2"), 0);
        assert_eq!(digits("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_stamp_display() {
        let stamp = BuildStamp {
            version: "1.2.0",
            build_number: 7,
            build_timestamp: "2025-03-01T10:00:00Z",
        };
        assert_eq!(stamp.to_string(), "kilojoules 1.2.0 (build 7, 2025-03-01T10:00:00Z)");
        assert_eq!(BuildStamp::CURRENT.version, VERSION);
    }
}
