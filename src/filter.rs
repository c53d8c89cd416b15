//! Package view queries: filter, search and sort.
//!
//! A [`PackageFilter`] selects a view over a [`PackageSet`] without
//! modifying it. Category flags combine with OR, the search term narrows the
//! result further, and the view is always sorted by name.

use crate::graph::{Package, PackageSet};

/// Package categories a view can be restricted to.
///
/// With no flag set every package matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterFlags {
    /// Packages no other installed package depends on.
    pub direct: bool,
    /// Packages at least one installed package depends on.
    pub deps: bool,
    /// Packages with a non-empty conflict set.
    pub conflicts: bool,
}

impl FilterFlags {
    pub const NONE: FilterFlags = FilterFlags {
        direct: false,
        deps: false,
        conflicts: false,
    };
    pub const DIRECT: FilterFlags = FilterFlags {
        direct: true,
        deps: false,
        conflicts: false,
    };
    pub const DEPS: FilterFlags = FilterFlags {
        direct: false,
        deps: true,
        conflicts: false,
    };
    pub const CONFLICTS: FilterFlags = FilterFlags {
        direct: false,
        deps: false,
        conflicts: true,
    };

    /// Returns true if no category is selected.
    pub fn is_empty(&self) -> bool {
        !(self.direct || self.deps || self.conflicts)
    }
}

impl std::ops::BitOr for FilterFlags {
    type Output = FilterFlags;

    fn bitor(self, rhs: FilterFlags) -> FilterFlags {
        FilterFlags {
            direct: self.direct || rhs.direct,
            deps: self.deps || rhs.deps,
            conflicts: self.conflicts || rhs.conflicts,
        }
    }
}

/// Selects and orders packages for display.
///
/// # Example
///
/// ```rust
/// use venvscope::filter::{FilterFlags, PackageFilter};
/// use venvscope::graph::{Dependency, Package, PackageSet};
///
/// let mut flask = Package::new("Flask", "2.0.1").unwrap();
/// flask.add_dependency(Dependency::unconstrained("click"));
///
/// let mut set = PackageSet::new();
/// set.insert(flask);
/// set.insert(Package::new("click", "8.1.3").unwrap());
///
/// let direct = PackageFilter::new().flags(FilterFlags::DIRECT).apply(&set);
/// assert_eq!(direct.len(), 1);
/// assert_eq!(direct[0].name(), "Flask");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFilter {
    pub flags: FilterFlags,
    pub ascending: bool,
    pub search: Option<String>,
}

impl Default for PackageFilter {
    fn default() -> Self {
        Self {
            flags: FilterFlags::NONE,
            ascending: true,
            search: None,
        }
    }
}

impl PackageFilter {
    /// Matches every package, sorted ascending by name.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(mut self, flags: FilterFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = ascending;
        self
    }

    /// Restricts the view to names containing `term`, ignoring case.
    /// An empty term matches everything.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.is_empty() { None } else { Some(term) };
        self
    }

    /// Returns the matching packages in name order.
    pub fn apply<'a>(&self, packages: &'a PackageSet) -> Vec<&'a Package> {
        let required = packages.required_names();
        let needle = self.search.as_ref().map(|s| s.to_lowercase());

        let mut view: Vec<&Package> = packages
            .iter()
            .filter(|p| {
                if self.flags.is_empty() {
                    return true;
                }
                let depended_on = required.contains(p.name());
                (self.flags.direct && !depended_on)
                    || (self.flags.deps && depended_on)
                    || (self.flags.conflicts && p.has_conflicts())
            })
            .filter(|p| match &needle {
                Some(needle) => p.name().to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        view.sort_by(|a, b| a.name().cmp(b.name()));
        if !self.ascending {
            view.reverse();
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Conflict, Dependency};

    fn create_test_set() -> PackageSet {
        let mut flask = Package::new("flask", "2.0.1").unwrap();
        flask.add_dependency(Dependency::unconstrained("click"));
        flask.add_dependency(Dependency::new("Werkzeug", "2.0"));
        flask.add_conflict(Conflict::new("Werkzeug", "1.0.1"));

        let mut set = PackageSet::new();
        set.insert(Package::new("requests", "2.28.0").unwrap());
        set.insert(flask);
        set.insert(Package::new("click", "8.1.3").unwrap());
        set.insert(Package::new("Werkzeug", "1.0.1").unwrap());
        set
    }

    fn names(view: Vec<&Package>) -> Vec<&str> {
        view.into_iter().map(Package::name).collect()
    }

    #[test]
    fn test_no_flags_returns_all_sorted() {
        let set = create_test_set();
        let view = PackageFilter::new().apply(&set);
        assert_eq!(names(view), vec!["Werkzeug", "click", "flask", "requests"]);
    }

    #[test]
    fn test_descending() {
        let set = create_test_set();
        let view = PackageFilter::new().ascending(false).apply(&set);
        assert_eq!(names(view), vec!["requests", "flask", "click", "Werkzeug"]);
    }

    #[test]
    fn test_direct_and_deps() {
        let set = create_test_set();

        let direct = PackageFilter::new().flags(FilterFlags::DIRECT).apply(&set);
        assert_eq!(names(direct), vec!["flask", "requests"]);

        let deps = PackageFilter::new().flags(FilterFlags::DEPS).apply(&set);
        assert_eq!(names(deps), vec!["Werkzeug", "click"]);
    }

    #[test]
    fn test_flags_combine_with_or() {
        let set = create_test_set();
        let view = PackageFilter::new()
            .flags(FilterFlags::DEPS | FilterFlags::CONFLICTS)
            .apply(&set);
        assert_eq!(names(view), vec!["Werkzeug", "click", "flask"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let set = create_test_set();
        let view = PackageFilter::new().search("WERK").apply(&set);
        assert_eq!(names(view), vec!["Werkzeug"]);

        let view = PackageFilter::new().search("").apply(&set);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_search_with_flags() {
        let set = create_test_set();
        let view = PackageFilter::new()
            .flags(FilterFlags::DIRECT)
            .search("req")
            .apply(&set);
        assert_eq!(names(view), vec!["requests"]);
    }

    #[test]
    fn test_flags_helpers() {
        assert!(FilterFlags::NONE.is_empty());
        assert!(!(FilterFlags::NONE | FilterFlags::CONFLICTS).is_empty());
        assert_eq!(FilterFlags::default(), FilterFlags::NONE);
    }
}
