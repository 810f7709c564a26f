//! Fixture files and the test cases parsed from them
//!
//! A fixture is UTF-8 text with two sections, the source expression and the
//! expected-result expression, separated by a line made of `=` characters.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FixtureError, HarnessError};

/// A fixture as discovered on disk: either a runnable case or the reason it is not one
pub type Fixture = Result<TestCase, FixtureError>;

/// One golden test: an expression and the expression it must evaluate equal to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Fixture file name, used only for diagnostics
    pub identity: String,
    pub source_expression: String,
    pub expected_expression: String,
}

impl TestCase {
    pub fn new(
        identity: impl Into<String>,
        source_expression: impl Into<String>,
        expected_expression: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            source_expression: source_expression.into(),
            expected_expression: expected_expression.into(),
        }
    }

    /// Scheduling cost estimate; shorter sources run first
    pub fn cost(&self) -> usize {
        self.source_expression.chars().count()
    }
}

/// Parse fixture text into a test case.
///
/// The text is divided on its last separator line. Both halves are stripped of
/// surrounding whitespace and `=` padding and must be non-empty.
pub fn parse_fixture(identity: &str, contents: &str) -> Result<TestCase, FixtureError> {
    let malformed = |reason: &str| FixtureError::Malformed {
        identity: identity.to_string(),
        reason: reason.to_string(),
    };

    let lines: Vec<&str> = contents.lines().collect();
    let separator = lines
        .iter()
        .rposition(|line| is_separator(line))
        .ok_or_else(|| malformed("no separator line"))?;

    let source = strip_section(&lines[..separator].join("\n"));
    let expected = strip_section(&lines[separator + 1..].join("\n"));

    if source.is_empty() {
        return Err(malformed("empty source expression"));
    }
    if expected.is_empty() {
        return Err(malformed("empty expected expression"));
    }

    Ok(TestCase::new(identity, source, expected))
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '=')
}

fn strip_section(section: &str) -> String {
    section
        .trim_matches(|c: char| c == '=' || c.is_whitespace())
        .to_string()
}

/// Load a single fixture file
pub fn load_fixture(path: impl AsRef<Path>) -> Result<TestCase, FixtureError> {
    let path = path.as_ref();
    let identity = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let contents = fs::read_to_string(path).map_err(|source| FixtureError::Unreadable {
        identity: identity.clone(),
        source,
    })?;

    parse_fixture(&identity, &contents)
}

/// Load every fixture with the given extension from a directory.
///
/// Unparseable files are returned as errors in place so the caller can report
/// them as failing cases. Entries come back sorted by file name.
pub fn load_all_fixtures(
    dir: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<Fixture>, HarnessError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| HarnessError::FixtureDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| HarnessError::FixtureDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            paths.push(path);
        }
    }
    paths.sort();

    debug!("Found {} fixtures in {}", paths.len(), dir.display());

    Ok(paths
        .iter()
        .map(|path| {
            let fixture = load_fixture(path);
            if let Err(err) = &fixture {
                warn!("{}", err);
            }
            fixture
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_simple_fixture() {
        let case = parse_fixture("a.golden", "1 + 1\n=\n2\n").unwrap();
        assert_eq!(case.identity, "a.golden");
        assert_eq!(case.source_expression, "1 + 1");
        assert_eq!(case.expected_expression, "2");
    }

    #[test]
    fn test_cost_is_character_count() {
        assert_eq!(TestCase::new("u.golden", "ééé", "3").cost(), 3);
        assert_eq!(TestCase::new("a.golden", "abcd", "4").cost(), 4);
    }

    #[test]
    fn test_parse_strips_padding() {
        let contents = "=====\n  { a = 1; b = 2; }\n\n==========\n{ b = 2; a = 1; }\n";
        let case = parse_fixture("pad.golden", contents).unwrap();
        assert_eq!(case.source_expression, "{ a = 1; b = 2; }");
        assert_eq!(case.expected_expression, "{ b = 2; a = 1; }");
    }

    #[test]
    fn test_parse_multiline_sections() {
        let contents = "let\n  x = 1;\nin\n  x\n=\n1\n";
        let case = parse_fixture("ml.golden", contents).unwrap();
        assert_eq!(case.source_expression, "let\n  x = 1;\nin\n  x");
    }

    #[test]
    fn test_parse_uses_last_separator() {
        let case = parse_fixture("last.golden", "a\n=\nb\n=\nc").unwrap();
        assert_eq!(case.source_expression, "a\n=\nb");
        assert_eq!(case.expected_expression, "c");
    }

    #[test]
    fn test_parse_keeps_inline_equals() {
        let case = parse_fixture("eq.golden", "x == y\n=\ntrue").unwrap();
        assert_eq!(case.source_expression, "x == y");
    }

    #[test]
    fn test_missing_separator_is_malformed() {
        let err = parse_fixture("bad.golden", "1 + 1\n2\n").unwrap_err();
        assert!(matches!(err, FixtureError::Malformed { .. }));
        assert_eq!(err.identity(), "bad.golden");
    }

    #[test]
    fn test_empty_section_is_malformed() {
        assert!(parse_fixture("e.golden", "1 + 1\n=\n   \n").is_err());
        assert!(parse_fixture("e.golden", "\n=\n2").is_err());
    }

    #[test]
    fn test_load_all_fixtures_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("00002.golden"), "2\n=\n2").unwrap();
        fs::write(dir.path().join("00001.golden"), "1\n=\n1").unwrap();
        fs::write(dir.path().join("00003.golden"), "no separator").unwrap();
        fs::write(dir.path().join("notes.txt"), "1\n=\n1").unwrap();

        let fixtures = load_all_fixtures(dir.path(), "golden").unwrap();
        assert_eq!(fixtures.len(), 3);
        assert_eq!(fixtures[0].as_ref().unwrap().identity, "00001.golden");
        assert_eq!(fixtures[1].as_ref().unwrap().identity, "00002.golden");
        assert!(fixtures[2].is_err());
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = tempdir().unwrap();
        let result = load_all_fixtures(dir.path().join("missing"), "golden");
        assert!(matches!(result, Err(HarnessError::FixtureDir { .. })));
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = load_fixture(dir.path().join("gone.golden")).unwrap_err();
        assert!(matches!(err, FixtureError::Unreadable { .. }));
        assert_eq!(err.identity(), "gone.golden");
    }
}
