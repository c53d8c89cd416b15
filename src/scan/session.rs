//! A scanning session over one environment.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{CancelToken, ScanError, ScanReport, Scanner};
use crate::collector::{PackageTool, PipCollector};
use crate::config::Config;
use crate::error::Result;
use crate::export::{self, ExportData, ExportFormat};
use crate::graph::{Package, PackageSet};
use crate::store::Store;

/// The state of one environment under inspection.
///
/// A session owns its package collection and remembers the message of its
/// most recent failure. Sessions are independent: nothing here is shared
/// between them, so any number can run side by side.
///
/// A successful scan replaces the collection wholesale. A failed or
/// cancelled scan leaves the previous collection in place.
#[derive(Debug)]
pub struct Session {
    env_root: PathBuf,
    config: Config,
    packages: PackageSet,
    last_error: Option<String>,
    last_report: Option<ScanReport>,
    cancel: CancelToken,
}

impl Session {
    /// Creates a session with the default configuration.
    pub fn new(env_root: impl Into<PathBuf>) -> Self {
        Self::with_config(env_root, Config::default())
    }

    pub fn with_config(env_root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            env_root: env_root.into(),
            config,
            packages: PackageSet::new(),
            last_error: None,
            last_report: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn env_root(&self) -> &Path {
        &self.env_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn packages(&self) -> &PackageSet {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Returns a token that cancels this session's scans.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Message of the most recent failed operation, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Counters from the most recent successful scan.
    pub fn last_report(&self) -> Option<ScanReport> {
        self.last_report
    }

    /// Scans the environment with its own interpreter.
    pub fn scan(&mut self) -> Result<ScanReport> {
        let result = self.validate_root().and_then(|()| {
            PipCollector::new(&self.env_root, &self.config)
                .map_err(|e| ScanError::Collect(e).into())
        });
        let collector = self.record(result)?;
        self.scan_with(&collector)
    }

    /// Scans the environment through `tool`.
    ///
    /// The environment root must still be an existing directory.
    pub fn scan_with<T: PackageTool + Sync>(&mut self, tool: &T) -> Result<ScanReport> {
        let valid = self.validate_root();
        self.record(valid)?;
        info!(root = %self.env_root.display(), "scanning environment");
        let result: Result<(PackageSet, ScanReport)> = Scanner::new(tool, &self.config)
            .with_cancel(self.cancel.clone())
            .run()
            .map_err(Into::into);
        let (packages, report) = self.record(result)?;

        self.packages = packages;
        self.last_report = Some(report);
        Ok(report)
    }

    fn validate_root(&self) -> Result<()> {
        if self.env_root.as_os_str().is_empty() || !self.env_root.is_dir() {
            return Err(ScanError::InvalidPath(self.env_root.clone()).into());
        }
        Ok(())
    }

    /// Records conflict edges on the current collection.
    ///
    /// Appends to any conflicts already recorded; see
    /// [`PackageSet::clear_conflicts`].
    pub fn detect_conflicts(&mut self) -> bool {
        crate::conflict::detect_conflicts(&mut self.packages)
    }

    /// Writes the current collection to `path`.
    pub fn export(&mut self, format: ExportFormat, path: &Path) -> Result<()> {
        let data = ExportData::new(&self.env_root, &self.packages);
        let result: Result<()> = export::export_to_path(format, &data, path).map_err(Into::into);
        self.record(result)
    }

    /// Replaces the store's contents with the current collection.
    pub fn save(&mut self, store: &mut Store) -> Result<()> {
        let result: Result<()> = store
            .save_session(&self.env_root, &self.packages)
            .map_err(Into::into);
        self.record(result)
    }

    /// Replaces the current collection with the store's contents.
    ///
    /// The environment root is taken from the store when it has one.
    /// Conflicts are not persisted; run [`Session::detect_conflicts`] again.
    pub fn load(&mut self, store: &Store) -> Result<()> {
        let (env_root, packages) = self.record(store.load_session().map_err(Into::into))?;
        if let Some(env_root) = env_root {
            self.env_root = env_root;
        }
        self.packages = packages;
        Ok(())
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "session operation failed");
                self.last_error = Some(e.to_string());
            }
        }
        result
    }
}
