//! Database schema, applied on every open.

pub(super) const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS packages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL UNIQUE,
    version     TEXT    NOT NULL,
    description TEXT,
    size        INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS dependencies (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    package_id         INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    dependency_name    TEXT    NOT NULL,
    version_constraint TEXT    NOT NULL DEFAULT '*',
    UNIQUE (package_id, dependency_name)
);

CREATE INDEX IF NOT EXISTS idx_dependencies_package ON dependencies(package_id);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";
