//! Export functionality for scanned environments.
//!
//! This module provides exporters for writing a package set to a file or
//! any other writer, in two formats: JSON for tools and Graphviz DOT for
//! rendering the dependency graph.

pub mod dot;
pub mod json;

use crate::error::ErrorKind;
use crate::graph::PackageSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format - machine-readable, full data
    Json,
    /// Graphviz DOT format - dependency graph for rendering
    Dot,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: json, dot",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Dot => write!(f, "dot"),
        }
    }
}

/// Errors that can occur while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The destination could not be created or written.
    #[error("Failed to export to '{}': {source}", .path.display())]
    Failed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Failed { .. } => ErrorKind::ExportFailed,
        }
    }
}

/// Data container for export operations.
#[derive(Debug, Clone, Copy)]
pub struct ExportData<'a> {
    /// Root of the scanned environment, as displayed to the user
    pub environment: &'a Path,
    /// The packages to export
    pub packages: &'a PackageSet,
}

impl<'a> ExportData<'a> {
    pub fn new(environment: &'a Path, packages: &'a PackageSet) -> Self {
        Self {
            environment,
            packages,
        }
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the data to the given writer.
    fn export<W: Write>(&self, data: &ExportData<'_>, writer: &mut W) -> io::Result<()>;
}

/// Export data in the specified format.
pub fn export<W: Write>(
    format: ExportFormat,
    data: &ExportData<'_>,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter.export(data, writer),
        ExportFormat::Dot => dot::DotExporter.export(data, writer),
    }
}

/// Export data to a string.
pub fn export_to_string(format: ExportFormat, data: &ExportData<'_>) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, data, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Export data to a file, creating or truncating it.
pub fn export_to_path(
    format: ExportFormat,
    data: &ExportData<'_>,
    path: &Path,
) -> Result<(), ExportError> {
    let failed = |source: io::Error| ExportError::Failed {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(failed)?;
    let mut writer = BufWriter::new(file);
    export(format, data, &mut writer).map_err(failed)?;
    writer.flush().map_err(failed)?;

    info!(path = %path.display(), %format, packages = data.packages.len(), "exported packages");
    Ok(())
}
