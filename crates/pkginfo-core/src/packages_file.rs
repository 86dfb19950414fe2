//! The packages file: one dotted package name per line.
//!
//! The file is always UTF-8 and always uses LF as the separator, on every
//! platform, so it can be compared byte-for-byte between runs.

use std::fs;
use std::path::Path;

use crate::digest::{FileState, file_state};
use crate::entry::{PackageEntry, PackageSet};
use crate::error::{ScanError, SynthError};

/// Render a package set in packages file format.
pub fn render_packages(packages: &PackageSet) -> String {
    let mut out = String::new();
    for entry in packages {
        out.push_str(entry.name());
        out.push('\n');
    }
    out
}

/// Write the packages file, creating its parent directory if needed.
///
/// A file that already holds exactly these packages is left untouched, so its
/// modification time only moves when the package set changes. Returns whether
/// the file was written.
pub fn write_packages_file(path: &Path, packages: &PackageSet) -> Result<bool, ScanError> {
    let contents = render_packages(packages);
    let state = file_state(path, contents.as_bytes()).map_err(|e| ScanError::io(path, e))?;
    if state == FileState::UpToDate {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ScanError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| ScanError::io(path, e))?;
    Ok(true)
}

/// Parse packages file text.
///
/// Only LF separates lines. Blank lines and lines that are not valid package
/// names are skipped.
pub fn parse_packages(text: &str) -> PackageSet {
    text.split('\n').filter_map(PackageEntry::new).collect()
}

/// Read a packages file written by [`write_packages_file`].
pub fn read_packages_file(path: &Path) -> Result<PackageSet, SynthError> {
    let bytes = fs::read(path).map_err(|e| SynthError::io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|_| SynthError::InvalidPackagesFile {
        path: path.to_path_buf(),
    })?;
    Ok(parse_packages(&text))
}
