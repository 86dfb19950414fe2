//! Brings an output tree in line with a package set.
//!
//! Runs in two phases. Cleanup walks the output root bottom-up and removes
//! everything that is not the declaration of an active package or a directory
//! leading to one. Creation then writes every declaration whose content is
//! missing or has drifted, in parallel.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use jwalk::WalkDir;
use rayon::prelude::*;

use pkginfo_core::{
    FileState, PackageEntry, PackageSet, SynthConfig, SynthError, file_state, read_packages_file,
};

use crate::report::{Removal, SynthesisReport, WriteOutcome};
use crate::template::Template;

/// Relative paths of active packages and every directory above them.
struct PackageIndex {
    packages: HashSet<PathBuf>,
    prefixes: HashSet<PathBuf>,
}

impl PackageIndex {
    fn new(packages: &PackageSet) -> Self {
        let mut index = Self {
            packages: HashSet::with_capacity(packages.len()),
            prefixes: HashSet::new(),
        };

        for entry in packages {
            let path = entry.relative_path();
            index.packages.insert(path.to_path_buf());
            for ancestor in path.ancestors() {
                if ancestor.as_os_str().is_empty() || !index.prefixes.insert(ancestor.to_path_buf()) {
                    break;
                }
            }
        }

        index
    }

    /// Some active package lives at or below `dir`.
    fn leads_to_package(&self, dir: &Path) -> bool {
        self.prefixes.contains(dir)
    }

    fn is_package(&self, dir: &Path) -> bool {
        self.packages.contains(dir)
    }
}

/// Writes declaration files for a package set and removes stale ones.
pub struct Synthesizer {
    config: SynthConfig,
}

impl Synthesizer {
    /// Create a synthesizer.
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// Make the output root match `packages` exactly.
    pub fn synthesize<T>(
        &self,
        packages: &PackageSet,
        template: &T,
    ) -> Result<SynthesisReport, SynthError>
    where
        T: Template + ?Sized,
    {
        let start = Instant::now();
        let mut report = SynthesisReport::default();

        // Cleanup must finish before any write starts.
        let removals = self.plan_cleanup(packages)?;
        for removal in &removals {
            remove(removal)?;
            tracing::debug!(path = %removal.path.display(), "removed stale entry");
        }
        report.removed = removals;

        let outcomes = self.in_pool(|| {
            packages
                .par_iter()
                .map(|entry| self.write_declaration(entry, template))
                .collect::<Result<Vec<_>, _>>()
        })??;
        for (path, outcome) in outcomes {
            report.record(path, outcome);
        }

        report.duration = start.elapsed();
        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged,
            removed = report.removed.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "synthesis finished"
        );

        Ok(report)
    }

    /// Read a packages file and synthesize from it.
    pub fn synthesize_from_file<T>(
        &self,
        packages_file: &Path,
        template: &T,
    ) -> Result<SynthesisReport, SynthError>
    where
        T: Template + ?Sized,
    {
        let packages = read_packages_file(packages_file)?;
        self.synthesize(&packages, template)
    }

    /// Report what [`synthesize`](Self::synthesize) would do, without touching
    /// the filesystem.
    pub fn plan<T>(&self, packages: &PackageSet, template: &T) -> Result<SynthesisReport, SynthError>
    where
        T: Template + ?Sized,
    {
        let start = Instant::now();
        let mut report = SynthesisReport {
            removed: self.plan_cleanup(packages)?,
            ..SynthesisReport::default()
        };

        let outcomes = self.in_pool(|| {
            packages
                .par_iter()
                .map(|entry| self.check_declaration(entry, template))
                .collect::<Result<Vec<_>, _>>()
        })??;
        for (path, outcome) in outcomes {
            report.record(path, outcome);
        }

        report.duration = start.elapsed();
        Ok(report)
    }

    /// Collect removal targets below the output root, deepest entries first.
    fn plan_cleanup(&self, packages: &PackageSet) -> Result<Vec<Removal>, SynthError> {
        let root = &self.config.output_root;
        match fs::metadata(root) {
            Ok(m) if m.is_dir() => {}
            Ok(_) => {
                return Err(SynthError::NotADirectory {
                    path: root.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SynthError::io(root, e)),
        }

        let mut entries = Vec::new();
        for entry_result in WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(1)
            .sort(true)
        {
            let entry = entry_result.map_err(|e| walk_error(root, e))?;
            entries.push((entry.depth, entry.path(), entry.file_type().is_dir()));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let index = PackageIndex::new(packages);
        let removals = entries
            .into_iter()
            .filter_map(|(_, path, is_dir)| {
                let relative = path.strip_prefix(root).ok()?;
                self.is_stale(relative, is_dir, &index)
                    .then(|| Removal { path, is_dir })
            })
            .collect();

        Ok(removals)
    }

    fn is_stale(&self, relative: &Path, is_dir: bool, index: &PackageIndex) -> bool {
        if is_dir {
            return !index.leads_to_package(relative);
        }

        match relative.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                relative.file_name() != Some(OsStr::new(&self.config.declaration_file))
                    || !index.is_package(dir)
            }
            // Loose files in the output root belong to no package.
            _ => true,
        }
    }

    fn write_declaration<T>(
        &self,
        entry: &PackageEntry,
        template: &T,
    ) -> Result<(PathBuf, WriteOutcome), SynthError>
    where
        T: Template + ?Sized,
    {
        let path = entry.declaration_path(&self.config.output_root, &self.config.declaration_file);
        let contents = template.render(entry.name()).into_bytes();

        let outcome = match file_state(&path, &contents).map_err(|e| SynthError::io(&path, e))? {
            FileState::UpToDate => return Ok((path, WriteOutcome::Unchanged)),
            FileState::Diverged => WriteOutcome::Updated,
            FileState::Missing => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| SynthError::io(parent, e))?;
                }
                WriteOutcome::Created
            }
        };

        fs::write(&path, &contents).map_err(|e| SynthError::io(&path, e))?;
        tracing::debug!(package = entry.name(), %outcome, "wrote declaration");
        Ok((path, outcome))
    }

    fn check_declaration<T>(
        &self,
        entry: &PackageEntry,
        template: &T,
    ) -> Result<(PathBuf, WriteOutcome), SynthError>
    where
        T: Template + ?Sized,
    {
        let path = entry.declaration_path(&self.config.output_root, &self.config.declaration_file);
        let contents = template.render(entry.name()).into_bytes();

        let outcome = match file_state(&path, &contents).map_err(|e| SynthError::io(&path, e))? {
            FileState::UpToDate => WriteOutcome::Unchanged,
            FileState::Diverged => WriteOutcome::Updated,
            FileState::Missing => WriteOutcome::Created,
        };
        Ok((path, outcome))
    }

    /// Run `op` on a dedicated pool when a thread count is configured.
    fn in_pool<R, F>(&self, op: F) -> Result<R, SynthError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        if self.config.threads == 0 {
            return Ok(op());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| SynthError::WorkerPool {
                message: e.to_string(),
            })?;
        Ok(pool.install(op))
    }
}

fn remove(removal: &Removal) -> Result<(), SynthError> {
    let result = if removal.is_dir {
        fs::remove_dir_all(&removal.path)
    } else {
        fs::remove_file(&removal.path)
    };
    result.map_err(|e| SynthError::io(&removal.path, e))
}

fn walk_error(root: &Path, err: jwalk::Error) -> SynthError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    SynthError::io(path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TextTemplate;
    use tempfile::TempDir;

    fn set(names: &[&str]) -> PackageSet {
        names.iter().filter_map(PackageEntry::new).collect()
    }

    fn synthesizer(temp: &TempDir) -> Synthesizer {
        Synthesizer::new(SynthConfig::new(temp.path().join("out")))
    }

    #[test]
    fn test_index_prefixes() {
        let index = PackageIndex::new(&set(&["a.b.c", "a.d"]));

        assert!(index.leads_to_package(Path::new("a")));
        assert!(index.leads_to_package(Path::new("a/b")));
        assert!(index.leads_to_package(Path::new("a/b/c")));
        assert!(!index.leads_to_package(Path::new("a/b/c/d")));
        assert!(!index.leads_to_package(Path::new("b")));

        assert!(index.is_package(Path::new("a/d")));
        assert!(!index.is_package(Path::new("a/b")));
    }

    #[test]
    fn test_is_stale() {
        let temp = TempDir::new().unwrap();
        let synth = synthesizer(&temp);
        let index = PackageIndex::new(&set(&["a.b"]));

        assert!(!synth.is_stale(Path::new("a"), true, &index));
        assert!(!synth.is_stale(Path::new("a/b"), true, &index));
        assert!(!synth.is_stale(Path::new("a/b/package-info.java"), false, &index));

        assert!(synth.is_stale(Path::new("c"), true, &index));
        assert!(synth.is_stale(Path::new("package-info.java"), false, &index));
        assert!(synth.is_stale(Path::new("a/package-info.java"), false, &index));
        assert!(synth.is_stale(Path::new("a/b/Other.java"), false, &index));
    }

    #[test]
    fn test_missing_output_root_needs_no_cleanup() {
        let temp = TempDir::new().unwrap();
        let synth = synthesizer(&temp);
        assert!(synth.plan_cleanup(&set(&["a"])).unwrap().is_empty());
    }

    #[test]
    fn test_output_root_is_a_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("out"), "").unwrap();
        let synth = synthesizer(&temp);

        let err = synth
            .synthesize(&set(&["a"]), &TextTemplate::default())
            .unwrap_err();
        assert!(matches!(err, SynthError::NotADirectory { .. }));
    }

    #[test]
    fn test_cleanup_is_bottom_up() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("x/y")).unwrap();
        fs::write(out.join("x/y/package-info.java"), "package x.y;").unwrap();

        let removals = synthesizer(&temp).plan_cleanup(&PackageSet::new()).unwrap();
        let paths: Vec<_> = removals.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                out.join("x/y/package-info.java"),
                out.join("x/y"),
                out.join("x"),
            ]
        );
    }

    #[test]
    fn test_dedicated_pool() {
        let temp = TempDir::new().unwrap();
        let config = SynthConfig::builder()
            .output_root(temp.path().join("out"))
            .threads(2usize)
            .build()
            .unwrap();

        let report = Synthesizer::new(config)
            .synthesize(&set(&["a", "b", "c"]), &TextTemplate::default())
            .unwrap();
        assert_eq!(report.created.len(), 3);
    }
}
