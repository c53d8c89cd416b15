//! Parser for `pip show <name>` output.
//!
//! The output is a block of `Key: value` lines. We read three of them:
//!
//! - `Summary:` becomes the package description.
//! - `Location:` is the site-packages directory the package lives in.
//! - `Requires:` lists dependency names. They may follow the marker on the
//!   same line, comma-separated, or sit on the lines below it indented by at
//!   least two spaces. The first following line without that indent ends
//!   the block.

use std::path::PathBuf;

const REQUIRES: &str = "Requires:";
const LOCATION: &str = "Location:";
const SUMMARY: &str = "Summary:";
const CONTINUATION_INDENT: &str = "  ";

/// Metadata extracted from one describe run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDetails {
    /// Dependency names, in listed order.
    pub requires: Vec<String>,
    /// Installation directory reported by the tool.
    pub location: Option<PathBuf>,
    /// One-line package summary.
    pub summary: Option<String>,
}

/// Parses describe output.
///
/// Missing fields are left empty; nothing here fails.
///
/// # Example
///
/// ```rust
/// use venvscope::parser::parse_show;
///
/// let details = parse_show("Requires: \n  click\n  jinja2\n\nOther: x\n");
/// assert_eq!(details.requires, vec!["click", "jinja2"]);
/// ```
pub fn parse_show(output: &str) -> PackageDetails {
    let mut details = PackageDetails::default();
    let mut lines = output.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim_end_matches('\r');

        if let Some(value) = line.strip_prefix(SUMMARY) {
            details.summary = non_empty(value);
        } else if let Some(value) = line.strip_prefix(LOCATION) {
            details.location = non_empty(value).map(PathBuf::from);
        } else if let Some(value) = line.strip_prefix(REQUIRES) {
            push_names(&mut details.requires, value);

            while let Some(continuation) =
                lines.next_if(|next| next.starts_with(CONTINUATION_INDENT))
            {
                push_names(&mut details.requires, continuation.trim_end_matches('\r'));
            }
        }
    }

    details
}

fn push_names(names: &mut Vec<String>, chunk: &str) {
    names.extend(
        chunk
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    );
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
