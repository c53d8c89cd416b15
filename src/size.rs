//! Installed-size measurement.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Returns the total size in bytes of the regular files under `dir`.
///
/// Symlinks are not followed. Fails if `dir` is not a directory or any entry
/// cannot be read.
pub fn measure_dir(dir: &Path) -> io::Result<u64> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' is not a directory", dir.display()),
        ));
    }

    let mut total = 0;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Candidate install directories for `name` under a site-packages `location`.
///
/// Distribution names use dashes where import packages use underscores, so
/// both spellings are tried, along with the lowercase form.
pub fn install_dir_candidates(location: &Path, name: &str) -> Vec<PathBuf> {
    let mut names = vec![name.to_string()];
    let underscored = name.replace('-', "_");
    if !names.contains(&underscored) {
        names.push(underscored.clone());
    }
    let lowered = underscored.to_lowercase();
    if !names.contains(&lowered) {
        names.push(lowered);
    }
    names.into_iter().map(|n| location.join(n)).collect()
}

/// Measures the first existing install directory for `name`.
pub fn measure_package(location: &Path, name: &str) -> io::Result<u64> {
    let dir = install_dir_candidates(location, name)
        .into_iter()
        .find(|p| p.is_dir())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no install directory for '{}' in '{}'", name, location.display()),
            )
        })?;
    measure_dir(&dir)
}

/// Formats a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_measure_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), vec![0u8; 100]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.py"), vec![0u8; 50]).unwrap();

        assert_eq!(measure_dir(dir.path()).unwrap(), 150);
    }

    #[test]
    fn test_measure_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = measure_dir(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_candidates() {
        let candidates = install_dir_candidates(Path::new("/sp"), "Typing-Extensions");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/sp/Typing-Extensions"),
                PathBuf::from("/sp/Typing_Extensions"),
                PathBuf::from("/sp/typing_extensions"),
            ]
        );

        let candidates = install_dir_candidates(Path::new("/sp"), "six");
        assert_eq!(candidates, vec![PathBuf::from("/sp/six")]);
    }

    #[test]
    fn test_measure_package_underscore_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("typing_extensions")).unwrap();
        fs::write(dir.path().join("typing_extensions/__init__.py"), vec![0u8; 42]).unwrap();

        assert_eq!(measure_package(dir.path(), "typing-extensions").unwrap(), 42);
        assert!(measure_package(dir.path(), "absent").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
