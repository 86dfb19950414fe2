//! Package entries.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::Serialize;

/// Default name of a package declaration file.
pub const DECLARATION_FILE: &str = "package-info.java";

/// An ordered, deduplicated set of packages.
pub type PackageSet = BTreeSet<PackageEntry>;

/// A Java package for which a declaration file should potentially be generated.
///
/// Entries are compared, ordered and hashed by [`name`](Self::name) only, never by
/// [`relative_path`](Self::relative_path). The same package found under two source
/// roots is a single entry.
#[derive(Debug, Clone, Serialize)]
pub struct PackageEntry {
    name: CompactString,
    relative_path: PathBuf,
}

impl PackageEntry {
    /// Create an entry from a dotted package name like `"java.nio.file"`.
    ///
    /// Returns `None` for names that cannot be written to the packages file or
    /// mapped back to a directory: blank names, names containing a newline, and
    /// names with an empty or path-like segment.
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref();
        if !is_valid_name(name) {
            return None;
        }

        let relative_path = name.split('.').collect::<PathBuf>();
        Some(Self {
            name: CompactString::new(name),
            relative_path,
        })
    }

    /// The dotted package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package path relative to a source or output root.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Location of this package's declaration file below `output_root`.
    pub fn declaration_path(&self, output_root: &Path, file_name: &str) -> PathBuf {
        output_root.join(&self.relative_path).join(file_name)
    }
}

impl PartialEq for PackageEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PackageEntry {}

impl PartialOrd for PackageEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for PackageEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Check whether a dotted name can be used as a package entry.
pub fn is_valid_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains('\n') {
        return false;
    }

    name.split('.')
        .all(|segment| !segment.is_empty() && !segment.contains(['/', '\\']))
}
