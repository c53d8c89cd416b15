//! venvscope - Python virtual environment dependency scanner
//!
//! This crate inspects a Python virtual environment by asking its own
//! package manager what is installed, builds the dependency graph between
//! the installed packages, and flags dependencies whose installed version is
//! below the required minimum. Results can be filtered, exported as JSON or
//! Graphviz DOT, and saved to a SQLite database.
//!
//! The entry point for most callers is [`scan::Session`].

pub mod collector;
pub mod config;
pub mod conflict;
pub mod error;
pub mod export;
pub mod filter;
pub mod graph;
pub mod parser;
pub mod scan;
pub mod size;
pub mod store;
pub mod version;

pub use error::{Error, ErrorKind, Result};
