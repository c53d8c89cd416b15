//! Version-constraint conflict detection.
//!
//! A conflict is recorded on package `P` when one of its dependency edges
//! names an installed package whose version does not meet the edge's
//! minimum-version constraint. Dependencies on packages that are not
//! installed are not conflicts.
//!
//! Detection only appends. Running it twice over the same set records every
//! conflict twice; call [`PackageSet::clear_conflicts`] first to recompute.

use tracing::{debug, info};

use crate::graph::{Conflict, PackageSet};
use crate::version::satisfies;

/// Checks every dependency edge and appends conflict edges on violations.
///
/// Returns true if at least one conflict edge was appended.
///
/// # Example
///
/// ```rust
/// use venvscope::conflict::detect_conflicts;
/// use venvscope::graph::{Dependency, Package, PackageSet};
///
/// let mut a = Package::new("a", "1.0.0").unwrap();
/// a.add_dependency(Dependency::new("b", "2.0.0"));
///
/// let mut set = PackageSet::new();
/// set.insert(a);
/// set.insert(Package::new("b", "1.0.0").unwrap());
///
/// assert!(detect_conflicts(&mut set));
/// assert_eq!(set.get("a").unwrap().conflicts().len(), 1);
/// ```
pub fn detect_conflicts(packages: &mut PackageSet) -> bool {
    let mut found: Vec<(usize, Conflict)> = Vec::new();

    for (idx, package) in packages.iter().enumerate() {
        for dep in package.dependencies() {
            let Some(target) = packages.get(&dep.name) else {
                continue;
            };
            if !satisfies(target.version(), &dep.constraint) {
                debug!(
                    package = package.name(),
                    dependency = %dep.name,
                    required = %dep.constraint,
                    installed = target.version(),
                    "constraint not satisfied"
                );
                found.push((idx, Conflict::new(target.name(), target.version())));
            }
        }
    }

    let has_conflicts = !found.is_empty();
    for (idx, conflict) in found {
        if let Some(package) = packages.get_index_mut(idx) {
            package.add_conflict(conflict);
        }
    }

    info!(has_conflicts, "conflict detection finished");
    has_conflicts
}
