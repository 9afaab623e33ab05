//! Import policy for published packages.
//!
//! Published packages may only depend on other registry packages, referenced
//! with the `pkg:` scheme:
//!
//! ```text
//! import("pkg:faust/owner/filters.lib@1.0.0");
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::Result;

/// Prefix every permitted import must carry.
pub const PACKAGE_IMPORT_PREFIX: &str = "pkg:";

/// Static check run on a compiled artifact before it may be published.
pub trait ImportChecker {
    /// `Ok(true)` when the artifact only uses package imports.
    fn check(&self, artifact: &Path) -> Result<bool>;
}

/// Rejects `import("…")` and `library("…")` references outside the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageImportChecker;

fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\b(?:import|library)\s*\(\s*"([^"]*)"\s*\)"#).expect("static regex is valid")
    })
}

/// Whether `prefix` ends inside a `//` line comment. Quoted text is skipped,
/// so URLs and doubled slashes in string literals do not count.
fn in_line_comment(prefix: &str) -> bool {
    let mut in_string = false;
    let mut chars = prefix.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_string = !in_string,
            '\\' if in_string => {
                chars.next();
            }
            '/' if !in_string && chars.peek() == Some(&'/') => return true,
            _ => {}
        }
    }
    false
}

/// Non-package references found on a single line.
pub fn disallowed_imports(line: &str) -> Vec<&str> {
    import_pattern()
        .captures_iter(line)
        .filter(|caps| !in_line_comment(&line[..caps.get(0).map_or(0, |m| m.start())]))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|target| !target.starts_with(PACKAGE_IMPORT_PREFIX))
        .collect()
}

impl ImportChecker for PackageImportChecker {
    fn check(&self, artifact: &Path) -> Result<bool> {
        let mut reader = BufReader::new(File::open(artifact)?);
        let mut buf = Vec::new();
        let mut compliant = true;
        let mut number = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(compliant);
            }
            number += 1;
            let line = String::from_utf8_lossy(&buf);
            for target in disallowed_imports(&line) {
                warn!("{}:{}: non-package import \"{}\"", artifact.display(), number, target);
                compliant = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_imports_pass() {
        assert!(disallowed_imports(r#"import("pkg:faust/alice/osc.lib@1.0.0");"#).is_empty());
        assert!(disallowed_imports(r#"fi = library("pkg:faust/bob/fi.lib@2.0.0");"#).is_empty());
    }

    #[test]
    fn relative_imports_fail() {
        assert_eq!(
            disallowed_imports(r#"import("stdfaust.lib"); import("pkg:x");"#),
            vec!["stdfaust.lib"]
        );
        assert_eq!(disallowed_imports(r#"x = library ( "local.lib" );"#), vec!["local.lib"]);
        assert_eq!(
            disallowed_imports(r#"import("https://evil.example/x.lib");"#),
            vec!["https://evil.example/x.lib"]
        );
        assert_eq!(
            disallowed_imports(r#"import("vendor//stdfaust.lib");"#),
            vec!["vendor//stdfaust.lib"]
        );
    }

    #[test]
    fn commented_imports_are_ignored() {
        assert!(disallowed_imports(r#"// import("stdfaust.lib");"#).is_empty());
        assert_eq!(
            disallowed_imports(r#"import("a.lib"); // import("b.lib");"#),
            vec!["a.lib"]
        );
        assert!(disallowed_imports(r#"x = "//"; // import("c.lib");"#).is_empty());
    }

    #[test]
    fn checks_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.lib");
        let bad = dir.path().join("bad.lib");
        std::fs::write(&ok, "import(\"pkg:faust/a/b.lib@1.0.0\");\nprocess = _;\n").unwrap();
        std::fs::write(&bad, "process = _;\nimport(\"maths.lib\");\n").unwrap();

        assert!(PackageImportChecker.check(&ok).unwrap());
        assert!(!PackageImportChecker.check(&bad).unwrap());
    }

    #[test]
    fn invalid_utf8_lines_are_still_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.lib");
        let mut content = b"declare author \"Andr\xe9\";\n".to_vec();
        content.extend_from_slice(b"import(\"maths.lib\");\n");
        std::fs::write(&path, content).unwrap();

        assert!(!PackageImportChecker.check(&path).unwrap());
    }
}
