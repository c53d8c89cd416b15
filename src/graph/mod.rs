//! Package model for a scanned environment.
//!
//! This module provides [`PackageSet`], the collection of packages found by
//! one scan, along with the [`Dependency`] and [`Conflict`] edges hanging off
//! each [`Package`]. The set can be projected onto a petgraph `DiGraph` for
//! graph export.
//!
//! # Example
//!
//! ```rust
//! use venvscope::graph::{Dependency, Package, PackageSet};
//!
//! let mut requests = Package::new("requests", "2.28.0").unwrap();
//! requests.add_dependency(Dependency::unconstrained("urllib3"));
//!
//! let mut set = PackageSet::new();
//! set.insert(requests);
//!
//! let graph = set.to_digraph();
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

mod package_set;

pub use package_set::{
    Conflict, Dependency, EmptyName, GraphEdge, GraphNode, Package, PackageSet,
};
