//! JWalk-based package tree scanner.

use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use compact_str::CompactString;
use globset::{Glob, GlobSet, GlobSetBuilder};
use itertools::Itertools;
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;

use pkginfo_core::{PackageEntry, PackageSet, ScanConfig, ScanError, write_packages_file};

use crate::stats::{PackageScan, ScanStats};

/// What a single directory turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    /// Contains at least one source file and no override.
    Package,
    /// Contains an override declaration; never generated.
    Overridden,
    /// Contains no source files.
    Empty,
}

/// Finds the active packages below a set of source roots.
pub struct PackageScanner {
    config: ScanConfig,
    ignore: Arc<GlobSet>,
}

impl PackageScanner {
    /// Create a scanner, compiling the configured ignore patterns.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("invalid ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self {
            config,
            ignore: Arc::new(ignore),
        })
    }

    /// Scan every configured root and merge the results.
    pub fn scan(&self) -> Result<PackageScan, ScanError> {
        let start = Instant::now();
        let mut packages = PackageSet::new();
        let mut stats = ScanStats::default();

        for root in &self.config.roots {
            self.scan_root(root, &mut packages, &mut stats)?;
        }

        stats.packages = packages.len() as u64;
        let duration = start.elapsed();
        tracing::info!(
            packages = stats.packages,
            directories = stats.directories,
            overridden = stats.overridden,
            elapsed_ms = duration.as_millis() as u64,
            "scan finished"
        );

        Ok(PackageScan {
            packages,
            stats,
            duration,
        })
    }

    /// Scan, then write the packages file if its content changed.
    pub fn scan_to_file(&self, packages_file: &Path) -> Result<PackageScan, ScanError> {
        let scan = self.scan()?;
        let written = write_packages_file(packages_file, &scan.packages)?;
        tracing::debug!(path = %packages_file.display(), written, "packages file synced");
        Ok(scan)
    }

    /// Scan a single root into `packages`.
    fn scan_root(
        &self,
        root: &Path,
        packages: &mut PackageSet,
        stats: &mut ScanStats,
    ) -> Result<(), ScanError> {
        let metadata = match fs::metadata(root) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(root = %root.display(), "source root does not exist, skipping");
                stats.missing_roots += 1;
                return Ok(());
            }
            Err(e) => return Err(ScanError::io(root, e)),
        };
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let directories = self.collect_directories(root)?;
        stats.directories += directories.len() as u64;

        let classified: Vec<(PathBuf, DirectoryKind)> = directories
            .into_par_iter()
            .map(|dir| -> Result<_, ScanError> {
                let kind = self.classify(&dir).map_err(|e| ScanError::io(&dir, e))?;
                Ok((dir, kind))
            })
            .collect::<Result<_, _>>()?;

        for (dir, kind) in classified {
            match kind {
                DirectoryKind::Empty => continue,
                DirectoryKind::Overridden => {
                    tracing::debug!(dir = %dir.display(), "package has an override, skipping");
                    stats.overridden += 1;
                    continue;
                }
                DirectoryKind::Package => {}
            }

            let Some(name) = package_name(root, &dir) else {
                // The root itself, or a path that is not valid UTF-8.
                continue;
            };
            match PackageEntry::new(&name) {
                Some(entry) => {
                    if !packages.insert(entry) {
                        tracing::debug!(package = %name, "package already found in another root");
                    }
                }
                None => {
                    tracing::debug!(package = ?name, "dropping unusable package name");
                    stats.rejected += 1;
                }
            }
        }

        Ok(())
    }

    /// Walk a root and return every directory below it, the root included.
    fn collect_directories(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let ignore = Arc::clone(&self.ignore);
        let walk_root = root.to_path_buf();

        let walker = WalkDir::new(root)
            .parallelism(parallelism(self.config.threads))
            .skip_hidden(!self.config.include_hidden)
            .follow_links(self.config.follow_symlinks)
            .min_depth(0)
            .max_depth(
                self.config
                    .max_depth
                    .map(|d| d as usize)
                    .unwrap_or(usize::MAX),
            )
            .process_read_dir(move |_depth, _path, _state, children| {
                // Only directories are walked; files are inspected per directory.
                children.retain(|child| match child {
                    Ok(entry) => {
                        entry.file_type().is_dir()
                            && !is_ignored(&ignore, &walk_root, &entry.path())
                    }
                    Err(_) => true,
                });
            });

        let mut directories = Vec::new();
        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        directories.push(entry.path());
                    }
                }
                Err(err) => return Err(walk_error(root, err)),
            }
        }

        Ok(directories)
    }

    /// Inspect the direct children of a directory.
    ///
    /// An override file wins as soon as it is seen, regardless of how many
    /// source files come before or after it.
    pub fn classify(&self, dir: &Path) -> std::io::Result<DirectoryKind> {
        let mut found_source = false;

        for child in fs::read_dir(dir)? {
            let child = child?;
            let file_name = child.file_name();

            if file_name.to_str().is_some_and(|n| self.config.is_override(n)) {
                return Ok(DirectoryKind::Overridden);
            }

            if !found_source && self.has_source_extension(&file_name) {
                let file_type = child.file_type()?;
                found_source = if file_type.is_symlink() {
                    child.path().is_file()
                } else {
                    file_type.is_file()
                };
            }
        }

        Ok(if found_source {
            DirectoryKind::Package
        } else {
            DirectoryKind::Empty
        })
    }

    fn has_source_extension(&self, file_name: &OsStr) -> bool {
        Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext == self.config.source_extension.as_str())
    }
}

/// Convert a directory below `root` into a dotted package name.
///
/// The relative path is normalized first, so `.` and `..` components never
/// reach the name. Returns `None` for the root itself and for paths that are
/// not valid UTF-8.
pub fn package_name(root: &Path, dir: &Path) -> Option<CompactString> {
    let relative = dir.strip_prefix(root).ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::ParentDir => {
                segments.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(CompactString::from(segments.iter().join(".")))
}

fn is_ignored(ignore: &GlobSet, root: &Path, path: &Path) -> bool {
    if ignore.is_empty() {
        return false;
    }
    path.strip_prefix(root)
        .is_ok_and(|relative| ignore.is_match(relative))
}

fn parallelism(threads: usize) -> Parallelism {
    match threads {
        0 => Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_millis(100),
        },
        1 => Parallelism::Serial,
        n => Parallelism::RayonNewPool(n),
    }
}

fn walk_error(root: &Path, err: jwalk::Error) -> ScanError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => ScanError::io(path, source),
        None => ScanError::Other { message },
    }
}
