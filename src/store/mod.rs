//! SQLite persistence for scanned packages.
//!
//! The store keeps three tables: `packages` (unique by name),
//! `dependencies` (unique by owning package and dependency name) and
//! `settings` (string key/value pairs). Writes are upserts, so saving the
//! same package twice never duplicates rows.
//!
//! Transactions are explicit: [`Store::begin_transaction`],
//! [`Store::commit`] and [`Store::rollback`] wrap a unit of work and may not
//! be nested. Nothing in this layer retries a failed statement.

mod schema;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ErrorKind;
use crate::graph::{Dependency, Package, PackageSet};

/// Settings key under which [`Store::save_session`] records the environment.
pub const VENV_PATH_KEY: &str = "venv_path";

/// Errors that can occur while using the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database could not be opened or its schema applied.
    #[error("Cannot open database: {message}")]
    Init { message: String },

    /// A statement failed.
    #[error("Database query failed: {message}")]
    Query { message: String },

    /// A statement violated a table constraint.
    #[error("Database constraint violated: {message}")]
    Constraint { message: String },

    /// A row the operation requires does not exist.
    #[error("Not found in database: {what}")]
    NotFound { what: String },
}

impl StoreError {
    /// Returns the taxonomy code for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Init { .. } => ErrorKind::InitFailed,
            StoreError::Query { .. } => ErrorKind::QueryFailed,
            StoreError::Constraint { .. } => ErrorKind::ConstraintViolation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    fn query(context: &str, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                StoreError::Constraint {
                    message: format!("{}: {}", context, err),
                }
            }
            _ => StoreError::Query {
                message: format!("{}: {}", context, err),
            },
        }
    }

    fn package_not_found(name: &str) -> Self {
        StoreError::NotFound {
            what: format!("package '{}'", name),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A handle to one package database.
///
/// The handle is not shared: concurrent transactions on one store are not
/// supported and callers must serialize their units of work.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    in_transaction: bool,
}

impl Store {
    /// Opens or creates the database at `path` and applies the schema.
    pub fn init(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|e| StoreError::Init {
            message: format!("{}: {}", path.display(), e),
        })?;
        info!(path = %path.display(), "opened package database");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Init {
            message: e.to_string(),
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(schema::SCHEMA)
            .map_err(|e| StoreError::Init {
                message: format!("schema execution failed: {}", e),
            })?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Returns true while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn begin_transaction(&mut self) -> StoreResult<()> {
        if self.in_transaction {
            return Err(StoreError::Query {
                message: "a transaction is already active".to_string(),
            });
        }
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| StoreError::query("failed to begin transaction", e))?;
        self.in_transaction = true;
        Ok(())
    }

    pub fn commit(&mut self) -> StoreResult<()> {
        self.require_transaction("commit")?;
        let result = self
            .conn
            .execute_batch("COMMIT")
            .map_err(|e| StoreError::query("failed to commit transaction", e));
        // A failed COMMIT may leave the transaction open; ask SQLite.
        self.in_transaction = !self.conn.is_autocommit();
        result
    }

    pub fn rollback(&mut self) -> StoreResult<()> {
        self.require_transaction("roll back")?;
        let result = self
            .conn
            .execute_batch("ROLLBACK")
            .map_err(|e| StoreError::query("failed to roll back transaction", e));
        self.in_transaction = !self.conn.is_autocommit();
        result
    }

    fn require_transaction(&self, action: &str) -> StoreResult<()> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(StoreError::Query {
                message: format!("cannot {}: no transaction is active", action),
            })
        }
    }

    /// Inserts a package or replaces the row with the same name.
    ///
    /// Only the package row is written; dependencies are stored with
    /// [`Store::add_dependency`]. Replacing keeps the row id, so existing
    /// dependency rows stay attached.
    pub fn insert_package(&self, package: &Package) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO packages (name, version, description, size)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET
                     version = excluded.version,
                     description = excluded.description,
                     size = excluded.size",
                params![
                    package.name(),
                    package.version(),
                    package.description(),
                    package.size() as i64
                ],
            )
            .map_err(|e| StoreError::query("failed to insert package", e))?;
        Ok(())
    }

    /// Updates an existing package row.
    pub fn update_package(&self, package: &Package) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE packages SET version = ?2, description = ?3, size = ?4 WHERE name = ?1",
                params![
                    package.name(),
                    package.version(),
                    package.description(),
                    package.size() as i64
                ],
            )
            .map_err(|e| StoreError::query("failed to update package", e))?;
        if changed == 0 {
            return Err(StoreError::package_not_found(package.name()));
        }
        Ok(())
    }

    /// Deletes a package and its dependency rows.
    pub fn delete_package(&self, name: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM packages WHERE name = ?1", params![name])
            .map_err(|e| StoreError::query("failed to delete package", e))?;
        if changed == 0 {
            return Err(StoreError::package_not_found(name));
        }
        Ok(())
    }

    /// Loads one package with its dependencies.
    pub fn get_package(&self, name: &str) -> StoreResult<Option<Package>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, version, description, size FROM packages WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| StoreError::query("failed to load package", e))?;

        match row {
            Some(row) => Ok(Some(self.build_package(row)?)),
            None => Ok(None),
        }
    }

    /// Loads every package with its dependencies, in insertion order.
    pub fn get_all_packages(&self) -> StoreResult<Vec<Package>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, version, description, size FROM packages ORDER BY id")
            .map_err(|e| StoreError::query("failed to prepare package query", e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(|e| StoreError::query("failed to query packages", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("failed to read package row", e))?;

        rows.into_iter().map(|row| self.build_package(row)).collect()
    }

    fn build_package(
        &self,
        (name, version, description, size): (String, String, Option<String>, i64),
    ) -> StoreResult<Package> {
        let mut package = Package::new(name, version).map_err(|e| StoreError::Query {
            message: format!("invalid package row: {}", e),
        })?;
        if let Some(description) = description {
            package.set_description(description);
        }
        package.set_size(size.max(0) as u64);
        for dep in self.get_dependencies(package.name())? {
            package.add_dependency(dep);
        }
        Ok(package)
    }

    /// Records that `package_name` depends on `dep_name`.
    ///
    /// Upserts on the (package, dependency name) pair. Fails with
    /// `NotFound` if the owning package has not been inserted.
    pub fn add_dependency(
        &self,
        package_name: &str,
        dep_name: &str,
        version_constraint: &str,
    ) -> StoreResult<()> {
        let package_id = self
            .package_id(package_name)?
            .ok_or_else(|| StoreError::package_not_found(package_name))?;

        self.conn
            .execute(
                "INSERT INTO dependencies (package_id, dependency_name, version_constraint)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(package_id, dependency_name) DO UPDATE SET
                     version_constraint = excluded.version_constraint",
                params![package_id, dep_name, version_constraint],
            )
            .map_err(|e| StoreError::query("failed to insert dependency", e))?;
        Ok(())
    }

    /// Removes one dependency row. Succeeds if there is nothing to remove.
    pub fn remove_dependency(&self, package_name: &str, dep_name: &str) -> StoreResult<()> {
        self.conn
            .execute(
                "DELETE FROM dependencies
                 WHERE package_id = (SELECT id FROM packages WHERE name = ?1)
                   AND dependency_name = ?2",
                params![package_name, dep_name],
            )
            .map_err(|e| StoreError::query("failed to remove dependency", e))?;
        Ok(())
    }

    /// Returns the stored dependencies of a package.
    ///
    /// An unknown package yields an empty list.
    pub fn get_dependencies(&self, package_name: &str) -> StoreResult<Vec<Dependency>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT d.dependency_name, d.version_constraint
                 FROM dependencies d
                 JOIN packages p ON d.package_id = p.id
                 WHERE p.name = ?1
                 ORDER BY d.id",
            )
            .map_err(|e| StoreError::query("failed to prepare dependency query", e))?;

        let deps = stmt
            .query_map(params![package_name], |row| {
                Ok(Dependency::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })
            .map_err(|e| StoreError::query("failed to query dependencies", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("failed to read dependency row", e))?;
        Ok(deps)
    }

    fn package_id(&self, name: &str) -> StoreResult<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM packages WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::query("failed to look up package", e))
    }

    /// Stores a setting, replacing any previous value.
    pub fn save_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| StoreError::query("failed to save setting", e))?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::query("failed to load setting", e))
    }

    /// Replaces the stored packages with `packages` in one transaction.
    ///
    /// Conflict edges are not stored. On failure the transaction is rolled
    /// back and the previous contents are kept.
    pub fn save_session(&mut self, env_root: &Path, packages: &PackageSet) -> StoreResult<()> {
        self.begin_transaction()?;
        match self.write_session(env_root, packages) {
            Ok(()) => {
                self.commit()?;
                info!(packages = packages.len(), "saved session to database");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.rollback() {
                    debug!(error = %rollback, "rollback after failed save also failed");
                }
                Err(e)
            }
        }
    }

    fn write_session(&self, env_root: &Path, packages: &PackageSet) -> StoreResult<()> {
        self.conn
            .execute_batch("DELETE FROM dependencies; DELETE FROM packages;")
            .map_err(|e| StoreError::query("failed to clear packages", e))?;

        for package in packages {
            self.insert_package(package)?;
            for dep in package.dependencies() {
                self.add_dependency(package.name(), &dep.name, &dep.constraint)?;
            }
        }

        self.save_setting(VENV_PATH_KEY, &env_root.to_string_lossy())
    }

    /// Rebuilds the saved package set and the environment it came from.
    pub fn load_session(&self) -> StoreResult<(Option<PathBuf>, PackageSet)> {
        let env_root = self.get_setting(VENV_PATH_KEY)?.map(PathBuf::from);
        let packages: PackageSet = self.get_all_packages()?.into_iter().collect();
        info!(packages = packages.len(), "loaded session from database");
        Ok((env_root, packages))
    }
}
