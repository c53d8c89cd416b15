//! In-memory package model.
//!
//! Packages live in a flat arena ([`PackageSet`]) indexed by position, with a
//! name index for lookups. Dependency and conflict edges refer to their
//! targets by name, so an edge may point at a package that is not installed.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::version::WILDCARD;

/// Returned when a package would be created without a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("package name must not be empty")]
pub struct EmptyName;

/// A directed dependency edge from a package to a required package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// Name of the required package, exactly as reported by the tool.
    pub name: String,
    /// Minimum version, or `*` when the tool reports no constraint.
    pub constraint: String,
}

impl Dependency {
    /// Creates a new dependency edge.
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }

    /// Creates an edge that any installed version satisfies.
    pub fn unconstrained(name: impl Into<String>) -> Self {
        Self::new(name, WILDCARD)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraint == WILDCARD {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}>={}", self.name, self.constraint)
        }
    }
}

/// A recorded constraint violation: the dependency's target is installed at
/// a version below what the owning package requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conflict {
    /// Name of the installed package that fails the constraint.
    pub name: String,
    /// Version of that package as installed.
    pub version: String,
}

impl Conflict {
    /// Creates a new conflict edge.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

/// An installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    version: String,
    description: Option<String>,
    size: u64,
    dependencies: Vec<Dependency>,
    conflicts: Vec<Conflict>,
}

impl Package {
    /// Creates a package with no edges and an unmeasured size.
    ///
    /// # Example
    ///
    /// ```rust
    /// use venvscope::graph::Package;
    ///
    /// let pkg = Package::new("flask", "2.0.1").unwrap();
    /// assert_eq!(pkg.name(), "flask");
    /// assert!(!pkg.is_size_known());
    /// assert!(Package::new("", "1.0").is_err());
    /// ```
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, EmptyName> {
        let name = name.into();
        if name.is_empty() {
            return Err(EmptyName);
        }
        Ok(Self {
            name,
            version: version.into(),
            description: None,
            size: 0,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw version string as discovered; not normalized.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Installed size in bytes. Zero means "not measured".
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns true once a nonzero size has been recorded.
    pub fn is_size_known(&self) -> bool {
        self.size > 0
    }

    /// Replaces the size with a fresh measurement.
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Appends a dependency edge. Duplicates are kept.
    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }

    /// Returns true if any dependency edge targets `name`.
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d.name == name)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Appends a conflict edge. Duplicates are kept.
    pub fn add_conflict(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    pub fn clear_conflicts(&mut self) {
        self.conflicts.clear();
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

/// Node weight of the projected dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: String,
    /// Installed version, `None` for dependency targets that are not installed.
    pub version: Option<String>,
    /// True if the package has at least one conflict edge.
    pub conflicted: bool,
}

impl GraphNode {
    /// Returns true if the node stands for an installed package.
    pub fn is_installed(&self) -> bool {
        self.version.is_some()
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}=={}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Edge weight of the projected dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub constraint: String,
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.constraint)
    }
}

/// The packages discovered by one scan.
///
/// Names are unique within a set: inserting a package whose name is already
/// present replaces the earlier entry in place.
///
/// # Example
///
/// ```rust
/// use venvscope::graph::{Dependency, Package, PackageSet};
///
/// let mut flask = Package::new("flask", "2.0.1").unwrap();
/// flask.add_dependency(Dependency::unconstrained("click"));
///
/// let mut set = PackageSet::new();
/// set.insert(flask);
/// set.insert(Package::new("click", "8.1.3").unwrap());
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.dependents_of("click").len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageSet {
    packages: Vec<Package>,
    index: HashMap<String, usize>,
}

impl PackageSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` packages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packages: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Adds a package and returns its position.
    pub fn insert(&mut self, package: Package) -> usize {
        if let Some(&idx) = self.index.get(package.name()) {
            self.packages[idx] = package;
            return idx;
        }
        let idx = self.packages.len();
        self.index.insert(package.name().to_string(), idx);
        self.packages.push(package);
        idx
    }

    /// Looks up a package by exact name.
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.index.get(name).map(|&idx| &self.packages[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Package> {
        match self.index.get(name) {
            Some(&idx) => self.packages.get_mut(idx),
            None => None,
        }
    }

    /// Returns the package stored at `idx`.
    pub fn get_index(&self, idx: usize) -> Option<&Package> {
        self.packages.get(idx)
    }

    pub(crate) fn get_index_mut(&mut self, idx: usize) -> Option<&mut Package> {
        self.packages.get_mut(idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    /// Removes every package.
    pub fn clear(&mut self) {
        self.packages.clear();
        self.index.clear();
    }

    /// Returns installed packages that list `name` as a dependency.
    pub fn dependents_of(&self, name: &str) -> Vec<&Package> {
        self.packages.iter().filter(|p| p.depends_on(name)).collect()
    }

    /// Returns the names that at least one installed package depends on.
    pub fn required_names(&self) -> HashSet<&str> {
        self.packages
            .iter()
            .flat_map(|p| p.dependencies().iter().map(|d| d.name.as_str()))
            .collect()
    }

    /// Returns packages whose conflict set is non-empty.
    pub fn conflicted(&self) -> Vec<&Package> {
        self.packages.iter().filter(|p| p.has_conflicts()).collect()
    }

    /// Empties every package's conflict set.
    pub fn clear_conflicts(&mut self) {
        for package in &mut self.packages {
            package.clear_conflicts();
        }
    }

    /// Sum of all measured package sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.packages.iter().map(Package::size).sum()
    }

    /// Total number of dependency edges, duplicates included.
    pub fn dependency_count(&self) -> usize {
        self.packages.iter().map(|p| p.dependencies().len()).sum()
    }

    /// Projects the set onto a directed graph.
    ///
    /// Every installed package becomes a node, and every dependency edge
    /// becomes a graph edge. Targets that are not installed get a node of
    /// their own with no version. Duplicate dependency edges are kept.
    pub fn to_digraph(&self) -> DiGraph<GraphNode, GraphEdge> {
        let mut graph = DiGraph::with_capacity(self.len(), self.dependency_count());
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.len());

        for package in &self.packages {
            let idx = graph.add_node(GraphNode {
                name: package.name().to_string(),
                version: Some(package.version().to_string()),
                conflicted: package.has_conflicts(),
            });
            nodes.insert(package.name(), idx);
        }

        for package in &self.packages {
            let from = nodes[package.name()];
            for dep in package.dependencies() {
                let to = match nodes.get(dep.name.as_str()) {
                    Some(&idx) => idx,
                    None => {
                        let idx = graph.add_node(GraphNode {
                            name: dep.name.clone(),
                            version: None,
                            conflicted: false,
                        });
                        nodes.insert(dep.name.as_str(), idx);
                        idx
                    }
                };
                graph.add_edge(
                    from,
                    to,
                    GraphEdge {
                        constraint: dep.constraint.clone(),
                    },
                );
            }
        }

        graph
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut set = PackageSet::new();
        for package in iter {
            set.insert(package);
        }
        set
    }
}

impl<'a> IntoIterator for &'a PackageSet {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
