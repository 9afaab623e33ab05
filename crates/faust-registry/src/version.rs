//! Declared-version extraction and version shape checks.
//!
//! Faust libraries declare their version with a metadata directive:
//!
//! ```text
//! declare version "2.1.0";
//! ```
//!
//! Extraction is deliberately loose (any dotted-numeric string), while the
//! publish gate applies the strict `MAJOR.MINOR.PATCH` check.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

fn declare_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"declare\s+version\s+"([0-9.]+)""#).expect("static regex is valid")
    })
}

fn semver_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("static regex is valid"))
}

/// Extract the first declared version from a single line, if any.
pub fn match_declared_version(line: &str) -> Option<&str> {
    declare_version_pattern()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Read `path` line by line and return the first declared version.
///
/// Returns `Ok(None)` for files without a declaration; an unversioned file
/// is valid input, it just cannot be placed in the registry.
pub fn extract_version(path: &Path) -> Result<Option<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(version) = match_declared_version(&line) {
            return Ok(Some(version.to_string()));
        }
    }
}

/// Check that `version` is exactly three dot-separated non-negative integers.
pub fn is_valid_version_format(version: &str) -> bool {
    semver_pattern().is_match(version)
}
