//! Benchmarks for conflict detection and graph export
//!
//! Builds synthetic environments where every package depends on a handful
//! of earlier packages, some with minimum versions the installed target
//! does not meet.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;
use venvscope::conflict::detect_conflicts;
use venvscope::export::{export_to_string, ExportData, ExportFormat};
use venvscope::filter::{FilterFlags, PackageFilter};
use venvscope::graph::{Dependency, Package, PackageSet};

/// Create a package set with `count` packages and up to `fan_out` edges each
fn create_package_set(count: usize, fan_out: usize) -> PackageSet {
    let mut set = PackageSet::with_capacity(count);
    for i in 0..count {
        let mut package = Package::new(format!("pkg-{}", i), format!("{}.{}.0", i % 7, i % 13))
            .expect("generated names are never empty");
        for j in 1..=fan_out.min(i) {
            let target = i - j;
            let constraint = if j % 3 == 0 {
                format!("{}.0.0", target % 7 + 1)
            } else {
                "*".to_string()
            };
            package.add_dependency(Dependency::new(format!("pkg-{}", target), constraint));
        }
        set.insert(package);
    }
    set
}

fn bench_detect_conflicts(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_conflicts");

    for count in [100, 1000, 5000] {
        let set = create_package_set(count, 5);
        group.bench_with_input(BenchmarkId::from_parameter(count), &set, |b, set| {
            b.iter(|| {
                let mut set = set.clone();
                black_box(detect_conflicts(&mut set))
            })
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut set = create_package_set(1000, 5);
    detect_conflicts(&mut set);
    let filter = PackageFilter::new()
        .flags(FilterFlags::DIRECT | FilterFlags::CONFLICTS)
        .search("pkg-1");

    c.bench_function("filter_1000", |b| b.iter(|| black_box(filter.apply(&set).len())));
}

fn bench_dot_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot_export");

    for count in [100, 1000] {
        let mut set = create_package_set(count, 5);
        detect_conflicts(&mut set);
        group.bench_with_input(BenchmarkId::from_parameter(count), &set, |b, set| {
            b.iter(|| {
                let data = ExportData::new(Path::new("/venv"), set);
                black_box(export_to_string(ExportFormat::Dot, &data).map(|s| s.len()))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detect_conflicts, bench_filter, bench_dot_export);
criterion_main!(benches);
