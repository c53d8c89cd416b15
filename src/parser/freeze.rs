//! Parser for `pip freeze` output.
//!
//! Each meaningful line has the form `name==version`. Lines without the
//! `==` separator (comments, editable installs, `name @ url` references)
//! are skipped and counted rather than treated as errors.

use std::fmt;

use crate::error::ErrorKind;

/// Separator between name and version in a freeze line.
pub const SEPARATOR: &str = "==";

/// A package pinned by one freeze line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeEntry {
    pub name: String,
    pub version: String,
}

/// A non-blank line that did not yield a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number within the freeze output.
    pub line_number: usize,
    pub content: String,
}

impl SkippedLine {
    /// Skipped lines are reported under the `ParseSkipped` code.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ParseSkipped
    }
}

impl fmt::Display for SkippedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.content)
    }
}

/// Everything parsed out of one freeze run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreezeListing {
    /// Parsed packages, in the order they were listed.
    pub entries: Vec<FreezeEntry>,
    /// Lines that were skipped.
    pub skipped: Vec<SkippedLine>,
}

impl FreezeListing {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parses freeze output line by line.
///
/// Blank lines are ignored silently and `#` comment lines are skipped even
/// if they contain `==`. Any other line is split at the first `==`.
/// Only a trailing `\r` is stripped: name and version keep any other
/// whitespace exactly as listed. A line with an empty name is skipped.
///
/// # Example
///
/// ```rust
/// use venvscope::parser::parse_freeze;
///
/// let listing = parse_freeze("flask==2.0.1\n\nrequests==2.28.0\n");
/// assert_eq!(listing.entries.len(), 2);
/// assert_eq!(listing.entries[1].name, "requests");
/// assert_eq!(listing.skipped_count(), 0);
/// ```
pub fn parse_freeze(output: &str) -> FreezeListing {
    let mut listing = FreezeListing::default();

    for (idx, raw) in output.lines().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }

        match line.split_once(SEPARATOR) {
            Some((name, version)) if !line.starts_with('#') && !name.is_empty() => {
                listing.entries.push(FreezeEntry {
                    name: name.to_string(),
                    version: version.to_string(),
                });
            }
            _ => listing.skipped.push(SkippedLine {
                line_number: idx + 1,
                content: line.to_string(),
            }),
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let listing = parse_freeze("flask==2.0.1\n\nrequests==2.28.0\n");

        assert_eq!(
            listing.entries,
            vec![
                FreezeEntry {
                    name: "flask".to_string(),
                    version: "2.0.1".to_string(),
                },
                FreezeEntry {
                    name: "requests".to_string(),
                    version: "2.28.0".to_string(),
                },
            ]
        );
        assert!(listing.skipped.is_empty());
    }

    #[test]
    fn test_malformed_line_skipped() {
        let listing = parse_freeze("flask==2.0.1\nnot a package line\nclick==8.1.3\n");

        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.skipped_count(), 1);
        assert_eq!(listing.skipped[0].line_number, 2);
        assert_eq!(listing.skipped[0].content, "not a package line");
        assert_eq!(listing.skipped[0].kind(), ErrorKind::ParseSkipped);
    }

    #[test]
    fn test_editable_and_url_lines_skipped() {
        let output = "# Editable install\n\
                      -e git+https://example.com/repo.git#egg=mypkg\n\
                      mylib @ file:///tmp/mylib\n\
                      six==1.16.0\n";
        let listing = parse_freeze(output);

        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "six");
        assert_eq!(listing.skipped_count(), 3);
    }

    #[test]
    fn test_empty_name_skipped() {
        let listing = parse_freeze("==1.0.0\n");
        assert!(listing.entries.is_empty());
        assert_eq!(listing.skipped_count(), 1);
    }

    #[test]
    fn test_crlf_stripped() {
        let listing = parse_freeze("numpy==1.24.2\r\npandas==2.0.0\r\n");
        assert_eq!(listing.entries[0].version, "1.24.2");
        assert_eq!(listing.entries[1].name, "pandas");
        assert_eq!(listing.entries[1].version, "2.0.0");
    }

    #[test]
    fn test_whitespace_preserved() {
        let listing = parse_freeze("  numpy==1.24.2  \n   \n");
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "  numpy");
        assert_eq!(listing.entries[0].version, "1.24.2  ");
        assert!(listing.skipped.is_empty());
    }

    #[test]
    fn test_case_preserved() {
        let listing = parse_freeze("Jinja2==3.1.2\n");
        assert_eq!(listing.entries[0].name, "Jinja2");
    }

    #[test]
    fn test_empty_output() {
        let listing = parse_freeze("");
        assert!(listing.entries.is_empty());
        assert!(listing.skipped.is_empty());
    }

    #[test]
    fn test_comment_with_separator_skipped() {
        let listing = parse_freeze("# pinned: flask==1.0\nflask==2.0.1\n");
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].version, "2.0.1");
        assert_eq!(listing.skipped[0].line_number, 1);
    }
}
