//! Dotted numeric version comparison.
//!
//! Versions are compared as `MAJOR.MINOR.PATCH` triples. Up to three
//! dot-separated integers are read from the left; anything after them is
//! ignored and missing components count as zero. Pre-release tags, build
//! metadata and range operators are not understood.
//!
//! A requirement is a single minimum version, or the wildcard [`WILDCARD`]
//! which every installed version satisfies.

use std::cmp::Ordering;
use std::fmt;

/// Requirement token that is satisfied by any installed version.
pub const WILDCARD: &str = "*";

/// A parsed `MAJOR.MINOR.PATCH` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Creates a version from its three components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses the leading numeric components of `input`.
    ///
    /// Returns `None` when not even the first component is numeric.
    ///
    /// # Example
    ///
    /// ```rust
    /// use venvscope::version::Version;
    ///
    /// assert_eq!(Version::parse("1.2"), Some(Version::new(1, 2, 0)));
    /// assert_eq!(Version::parse("2.0.1rc1"), Some(Version::new(2, 0, 1)));
    /// assert_eq!(Version::parse("abc"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = [0u64; 3];
        let mut rest = input.trim_start();
        let mut parsed = 0;

        while parsed < parts.len() {
            let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 {
                break;
            }
            match rest[..digits].parse::<u64>() {
                Ok(value) => parts[parsed] = value,
                Err(_) => break,
            }
            parsed += 1;
            rest = &rest[digits..];

            match rest.strip_prefix('.') {
                Some(tail) => rest = tail,
                None => break,
            }
        }

        if parsed == 0 {
            return None;
        }
        Some(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Outcome of [`compare`].
///
/// `Error` is reported instead of picking an arbitrary order when either
/// side is not a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrdering {
    Less,
    Equal,
    Greater,
    Error,
}

impl From<Ordering> for VersionOrdering {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => VersionOrdering::Less,
            Ordering::Equal => VersionOrdering::Equal,
            Ordering::Greater => VersionOrdering::Greater,
        }
    }
}

/// Compares two version strings.
///
/// # Example
///
/// ```rust
/// use venvscope::version::{compare, VersionOrdering};
///
/// assert_eq!(compare("2.0.0", "1.9.9"), VersionOrdering::Greater);
/// assert_eq!(compare("1.0", "1.0.1"), VersionOrdering::Less);
/// assert_eq!(compare("abc", "1.0"), VersionOrdering::Error);
/// ```
pub fn compare(a: &str, b: &str) -> VersionOrdering {
    match (Version::parse(a), Version::parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b).into(),
        _ => VersionOrdering::Error,
    }
}

/// Returns true if `installed` meets the minimum version `required`.
///
/// The wildcard requirement always passes, even against an unparseable
/// installed version. Any other parse failure fails closed.
pub fn satisfies(installed: &str, required: &str) -> bool {
    if required == WILDCARD {
        return true;
    }
    matches!(
        compare(installed, required),
        VersionOrdering::Equal | VersionOrdering::Greater
    )
}
