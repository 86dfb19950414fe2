//! Source tree scanning engine for pkginfo.
//!
//! Walks one or more source roots and finds every directory that is an active
//! Java package: it directly contains at least one `.java` file and does not
//! already carry a hand-written `package-info.java`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use pkginfo_scan::{PackageScanner, ScanConfig};
//!
//! let config = ScanConfig::new(["src/main/java"]);
//! let scanner = PackageScanner::new(config).unwrap();
//! let scan = scanner.scan_to_file(Path::new("build/packages")).unwrap();
//!
//! for name in scan.names() {
//!     println!("{name}");
//! }
//! ```

mod scanner;
mod stats;

use std::path::PathBuf;

pub use scanner::{DirectoryKind, PackageScanner, package_name};
pub use stats::{PackageScan, ScanStats};

// Re-export core types for convenience
pub use pkginfo_core::{PackageEntry, PackageSet, ScanConfig, ScanError};

/// Scan `roots` with default settings.
pub fn scan<I, P>(roots: I) -> Result<PackageSet, ScanError>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let scanner = PackageScanner::new(ScanConfig::new(roots))?;
    Ok(scanner.scan()?.packages)
}
