//! Parsers for package-manager output.
//!
//! The scan pipeline reads two text formats produced by `pip`:
//!
//! - **`pip freeze`** - one `name==version` pin per line ([`freeze`])
//! - **`pip show <name>`** - a `Key: value` metadata block ([`show`])
//!
//! Neither format has a schema, so both parsers are tolerant: lines they do
//! not understand are skipped instead of aborting the scan.
//!
//! # Example
//!
//! ```rust
//! use venvscope::parser::{parse_freeze, parse_show};
//!
//! let listing = parse_freeze("flask==2.0.1\nrequests==2.28.0\n");
//! assert_eq!(listing.entries.len(), 2);
//!
//! let details = parse_show("Location: /venv/lib/site-packages\nRequires: click\n");
//! assert_eq!(details.requires, vec!["click"]);
//! ```

pub mod freeze;
pub mod show;

pub use freeze::{parse_freeze, FreezeEntry, FreezeListing, SkippedLine};
pub use show::{parse_show, PackageDetails};
