//! The scan pipeline: list, describe, measure.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{CancelToken, ScanError, ScanReport, ScanResult};
use crate::collector::{PackageTool, ToolOperation};
use crate::config::Config;
use crate::graph::{Dependency, Package, PackageSet};
use crate::parser::{parse_freeze, parse_show, FreezeEntry};
use crate::size;

/// Outcome of inspecting one package.
struct Inspection {
    package: Package,
    describe_failed: bool,
    size_failed: bool,
}

/// Drives one scan against a [`PackageTool`].
///
/// Per-package describe and size steps run on a bounded rayon pool; the
/// results are merged back into a single [`PackageSet`] in listing order
/// before anything is returned.
pub struct Scanner<'a, T> {
    tool: &'a T,
    config: &'a Config,
    cancel: CancelToken,
}

impl<'a, T: PackageTool + Sync> Scanner<'a, T> {
    pub fn new(tool: &'a T, config: &'a Config) -> Self {
        Self {
            tool,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `cancel` to stop the scan between per-package steps.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the full pipeline and returns the discovered packages.
    pub fn run(&self) -> ScanResult<(PackageSet, ScanReport)> {
        let output = self
            .tool
            .run(&ToolOperation::Freeze)
            .map_err(ScanError::Collect)?;

        let listing = parse_freeze(&output);
        for skipped in &listing.skipped {
            debug!(%skipped, "skipping freeze line");
        }
        info!(
            packages = listing.entries.len(),
            skipped = listing.skipped_count(),
            "parsed package list"
        );

        let mut report = ScanReport {
            skipped_lines: listing.skipped_count(),
            ..ScanReport::default()
        };

        let mut pool = ThreadPoolBuilder::new();
        if self.config.workers > 0 {
            pool = pool.num_threads(self.config.workers);
        }
        let pool = pool
            .build()
            .map_err(|e| ScanError::Workers(e.to_string()))?;

        let inspections: Vec<Option<Inspection>> = pool.install(|| {
            listing
                .entries
                .par_iter()
                .map(|entry| self.inspect(entry))
                .collect()
        });

        if self.cancel.is_cancelled() {
            info!("scan cancelled");
            return Err(ScanError::Cancelled);
        }

        let mut packages = PackageSet::with_capacity(inspections.len());
        for inspection in inspections.into_iter().flatten() {
            if inspection.describe_failed {
                report.describe_failures += 1;
            }
            if inspection.size_failed {
                report.size_failures += 1;
            }
            packages.insert(inspection.package);
        }
        // Repeated names collapse into one entry.
        report.packages = packages.len();

        info!(
            packages = packages.len(),
            describe_failures = report.describe_failures,
            size_failures = report.size_failures,
            "scan finished"
        );
        Ok((packages, report))
    }

    /// Describes and measures one package. Returns `None` when cancelled.
    fn inspect(&self, entry: &FreezeEntry) -> Option<Inspection> {
        if self.cancel.is_cancelled() {
            return None;
        }

        // Parsing guarantees a non-empty name.
        let mut package = Package::new(entry.name.as_str(), entry.version.as_str()).ok()?;

        let details = match self.tool.run(&ToolOperation::Show(entry.name.clone())) {
            Ok(output) => Some(parse_show(&output)),
            Err(e) => {
                warn!(package = %entry.name, error = %e, "failed to describe package");
                None
            }
        };
        let describe_failed = details.is_none();

        let mut size_failed = false;
        if let Some(details) = details {
            for name in details.requires {
                package.add_dependency(Dependency::unconstrained(name));
            }
            if let Some(summary) = details.summary {
                package.set_description(summary);
            }

            if self.config.measure_sizes && !self.cancel.is_cancelled() {
                size_failed = !self.measure(&mut package, details.location.as_deref());
            }
        } else if self.config.measure_sizes {
            size_failed = true;
        }

        Some(Inspection {
            package,
            describe_failed,
            size_failed,
        })
    }

    fn measure(&self, package: &mut Package, location: Option<&Path>) -> bool {
        let Some(location) = location else {
            warn!(package = package.name(), "no install location reported");
            return false;
        };

        match size::measure_package(location, package.name()) {
            Ok(bytes) => {
                package.set_size(bytes);
                true
            }
            Err(e) => {
                warn!(package = package.name(), error = %e, "failed to measure package size");
                false
            }
        }
    }
}
