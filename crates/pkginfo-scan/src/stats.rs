//! Scan results and counters.

use std::time::Duration;

use serde::Serialize;

use pkginfo_core::{PackageEntry, PackageSet};

/// Counters collected while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Directories visited across all roots, roots included.
    pub directories: u64,
    /// Distinct active packages found.
    pub packages: u64,
    /// Directories skipped because they carry an override declaration.
    pub overridden: u64,
    /// Package names dropped because they could not be written safely.
    pub rejected: u64,
    /// Configured roots that do not exist.
    pub missing_roots: u64,
}

/// The outcome of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct PackageScan {
    /// Active packages, ordered by name.
    pub packages: PackageSet,
    pub stats: ScanStats,
    pub duration: Duration,
}

impl PackageScan {
    /// Package names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(PackageEntry::name)
    }
}
