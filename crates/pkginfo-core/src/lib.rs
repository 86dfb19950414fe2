//! Core types for pkginfo.
//!
//! This crate provides the data shared by the scanner and the synthesizer:
//! package entries, the packages file format, configuration and errors.

mod config;
mod digest;
mod entry;
mod error;
mod packages_file;

pub use config::{
    ProjectConfig, SOURCE_EXTENSION, ScanConfig, ScanConfigBuilder, SynthConfig,
    SynthConfigBuilder,
};
pub use digest::{FileState, file_state};
pub use entry::{DECLARATION_FILE, PackageEntry, PackageSet, is_valid_name};
pub use error::{ConfigError, ScanError, SynthError};
pub use packages_file::{
    parse_packages, read_packages_file, render_packages, write_packages_file,
};
