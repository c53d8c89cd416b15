//! JSON export implementation.
//!
//! Exports the scanned packages in JSON format for machine-readable output.
//! Every package carries its dependency and conflict lists, empty or not.

use super::{ExportData, Exporter};
use crate::graph::Package;
use serde::Serialize;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Serializable dependency edge for JSON output.
#[derive(Serialize)]
struct JsonDependency<'a> {
    name: &'a str,
    constraint: &'a str,
}

/// Serializable conflict edge for JSON output.
#[derive(Serialize)]
struct JsonConflict<'a> {
    name: &'a str,
    version: &'a str,
}

/// Serializable package for JSON output.
#[derive(Serialize)]
struct JsonPackage<'a> {
    name: &'a str,
    version: &'a str,
    description: Option<&'a str>,
    size: u64,
    dependencies: Vec<JsonDependency<'a>>,
    conflicts: Vec<JsonConflict<'a>>,
}

/// Root JSON export structure.
#[derive(Serialize)]
struct JsonExport<'a> {
    environment: String,
    packages: Vec<JsonPackage<'a>>,
}

impl<'a> From<&'a Package> for JsonPackage<'a> {
    fn from(package: &'a Package) -> Self {
        Self {
            name: package.name(),
            version: package.version(),
            description: package.description(),
            size: package.size(),
            dependencies: package
                .dependencies()
                .iter()
                .map(|d| JsonDependency {
                    name: &d.name,
                    constraint: &d.constraint,
                })
                .collect(),
            conflicts: package
                .conflicts()
                .iter()
                .map(|c| JsonConflict {
                    name: &c.name,
                    version: &c.version,
                })
                .collect(),
        }
    }
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData<'_>, writer: &mut W) -> io::Result<()> {
        let export = JsonExport {
            environment: data.environment.display().to_string(),
            packages: data.packages.iter().map(JsonPackage::from).collect(),
        };

        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Conflict, Dependency, PackageSet};
    use std::path::Path;

    fn create_test_set() -> PackageSet {
        let mut flask = Package::new("flask", "2.0.1").unwrap();
        flask.set_description("A simple framework for building complex web applications.");
        flask.set_size(4096);
        flask.add_dependency(Dependency::unconstrained("click"));
        flask.add_dependency(Dependency::new("werkzeug", "2.0"));
        flask.add_conflict(Conflict::new("werkzeug", "1.0.1"));

        let mut set = PackageSet::new();
        set.insert(flask);
        set.insert(Package::new("werkzeug", "1.0.1").unwrap());
        set
    }

    fn export_value(set: &PackageSet) -> serde_json::Value {
        let mut output = Vec::new();
        JsonExporter
            .export(&ExportData::new(Path::new("/srv/venv"), set), &mut output)
            .unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn test_json_export_valid() {
        let value = export_value(&create_test_set());

        assert_eq!(value["environment"], "/srv/venv");
        assert_eq!(value["packages"].as_array().unwrap().len(), 2);

        let flask = &value["packages"][0];
        assert_eq!(flask["name"], "flask");
        assert_eq!(flask["version"], "2.0.1");
        assert_eq!(flask["size"], 4096);
        assert_eq!(flask["dependencies"][0]["name"], "click");
        assert_eq!(flask["dependencies"][0]["constraint"], "*");
        assert_eq!(flask["dependencies"][1]["constraint"], "2.0");
        assert_eq!(flask["conflicts"][0]["name"], "werkzeug");
        assert_eq!(flask["conflicts"][0]["version"], "1.0.1");
    }

    #[test]
    fn test_json_export_empty_lists_present() {
        let value = export_value(&create_test_set());
        let werkzeug = &value["packages"][1];

        assert!(werkzeug["dependencies"].as_array().unwrap().is_empty());
        assert!(werkzeug["conflicts"].as_array().unwrap().is_empty());
        assert!(werkzeug["description"].is_null());
    }

    #[test]
    fn test_json_export_empty_set() {
        let value = export_value(&PackageSet::new());
        assert!(value["packages"].as_array().unwrap().is_empty());
    }
}
