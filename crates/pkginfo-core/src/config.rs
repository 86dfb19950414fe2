//! Scan, synthesis and project configuration.

use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entry::DECLARATION_FILE;
use crate::error::ConfigError;

/// Default source file extension.
pub const SOURCE_EXTENSION: &str = "java";

/// Configuration for scanning source roots.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Source roots, treated together as one logical tree.
    #[builder(default, setter(each(name = "root", into)))]
    pub roots: Vec<PathBuf>,

    /// Extension of source files, without the leading dot.
    #[builder(default = "SOURCE_EXTENSION.to_string()")]
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// File names that mark a directory as already declared.
    #[builder(default = "default_override_files()", setter(each(name = "override_file", into)))]
    #[serde(default = "default_override_files")]
    pub override_files: Vec<String>,

    /// Glob patterns for directories to skip, matched against root-relative paths.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden directories (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of threads for scanning (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

fn default_source_extension() -> String {
    SOURCE_EXTENSION.to_string()
}

fn default_override_files() -> Vec<String> {
    vec![DECLARATION_FILE.to_string()]
}

fn default_declaration_file() -> String {
    DECLARATION_FILE.to_string()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref extension) = self.source_extension {
            check_extension(extension)?;
        }
        Ok(())
    }
}

fn check_extension(extension: &str) -> Result<(), String> {
    if extension.is_empty() {
        return Err("Source extension cannot be empty".to_string());
    }
    if extension.starts_with('.') {
        return Err(format!(
            "Source extension must not start with a dot: {extension}"
        ));
    }
    Ok(())
}

fn check_file_name(field: &str, name: &str) -> Result<(), String> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(format!("{field} must be a plain file name: {name:?}"));
    }
    Ok(())
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning the given roots.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            source_extension: default_source_extension(),
            override_files: default_override_files(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            threads: 0,
        }
    }

    /// Check whether a file name is an override declaration.
    pub fn is_override(&self, name: &str) -> bool {
        self.override_files.iter().any(|o| o == name)
    }

    /// Validate values that the builder cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_extension(&self.source_extension).map_err(ConfigError::invalid)?;
        for name in &self.override_files {
            check_file_name("Override file", name).map_err(ConfigError::invalid)?;
        }
        for root in &self.roots {
            if !root.is_absolute() {
                return Err(ConfigError::RelativePath {
                    field: "Source root",
                    path: root.clone(),
                });
            }
            // Missing roots are skipped by the scanner; anything else must be a directory.
            if root.exists() && !root.is_dir() {
                return Err(ConfigError::NotADirectory {
                    field: "Source root",
                    path: root.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(Vec::<PathBuf>::new())
    }
}

/// Configuration for synthesizing declaration files.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SynthConfig {
    /// Directory that receives generated declaration files.
    pub output_root: PathBuf,

    /// Name of the generated file in each package directory.
    #[builder(default = "DECLARATION_FILE.to_string()")]
    #[serde(default = "default_declaration_file")]
    pub declaration_file: String,

    /// Number of worker threads for writing (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

impl SynthConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.output_root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Output root cannot be empty".to_string());
            }
            None => return Err("Output root is required".to_string()),
            _ => {}
        }
        if let Some(ref name) = self.declaration_file {
            check_file_name("Declaration file", name)?;
        }
        Ok(())
    }
}

impl SynthConfig {
    /// Create a new synth config builder.
    pub fn builder() -> SynthConfigBuilder {
        SynthConfigBuilder::default()
    }

    /// Create a simple config writing into `output_root`.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            declaration_file: default_declaration_file(),
            threads: 0,
        }
    }

    /// Validate values that the builder cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.output_root.is_absolute() {
            return Err(ConfigError::RelativePath {
                field: "Output root",
                path: self.output_root.clone(),
            });
        }
        if self.output_root.exists() && !self.output_root.is_dir() {
            return Err(ConfigError::NotADirectory {
                field: "Output root",
                path: self.output_root.clone(),
            });
        }
        check_file_name("Declaration file", &self.declaration_file).map_err(ConfigError::invalid)
    }
}

/// A whole project: what to scan, where the packages file lives and where the
/// declarations go.
///
/// Usually loaded from a `pkginfo.toml`:
///
/// ```toml
/// packages_file = "build/generated/pkginfo/packages"
/// template = "@NotNullByDefault\npackage {package};\n"
///
/// [scan]
/// roots = ["src/main/java"]
///
/// [synth]
/// output_root = "build/generated/pkginfo/src/main/java"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Location of the packages file shared by both steps.
    pub packages_file: PathBuf,

    /// Declaration template, `{package}` is replaced with the package name.
    #[serde(default)]
    pub template: Option<String>,

    pub scan: ScanConfig,

    pub synth: SynthConfig,
}

impl ProjectConfig {
    /// Conventional configuration file name.
    pub const FILE_NAME: &'static str = "pkginfo.toml";

    /// Load and validate a configuration file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base = std::path::absolute(&base).map_err(|e| ConfigError::read(&base, e))?;

        let config = Self::from_toml_str(&text, &base).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text, resolving relative paths against `base`.
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(text)?;
        config.resolve_paths(base);
        Ok(config)
    }

    /// Make every configured path absolute relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.packages_file = base.join(&self.packages_file);
        self.synth.output_root = base.join(&self.synth.output_root);
        for root in &mut self.scan.roots {
            *root = base.join(&*root);
        }
    }

    /// Validate the whole project.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.packages_file.is_absolute() {
            return Err(ConfigError::RelativePath {
                field: "Packages file",
                path: self.packages_file.clone(),
            });
        }
        if self.packages_file.is_dir() {
            return Err(ConfigError::invalid(format!(
                "Packages file is a directory: {}",
                self.packages_file.display()
            )));
        }
        if self.packages_file.starts_with(&self.synth.output_root) {
            return Err(ConfigError::invalid(
                "Packages file must not live inside the output root",
            ));
        }
        self.scan.validate()?;
        self.synth.validate()
    }
}
