//! Declaration file synthesis for pkginfo.
//!
//! Takes the package set produced by `pkginfo-scan` and makes an output root
//! hold exactly one declaration file per package. Stale files and directories
//! are removed first, then missing or drifted declarations are written in
//! parallel. Files whose content already matches are never touched, so their
//! modification times survive and incremental compilers stay quiet.
//!
//! # Example
//!
//! ```rust,no_run
//! use pkginfo_synth::{SynthConfig, Synthesizer, TextTemplate};
//!
//! let synthesizer = Synthesizer::new(SynthConfig::new("/project/build/generated"));
//! let report = synthesizer
//!     .synthesize_from_file("/project/build/packages".as_ref(), &TextTemplate::default())
//!     .unwrap();
//!
//! println!("{} created, {} removed", report.created.len(), report.removed.len());
//! ```

mod report;
mod synthesizer;
mod template;

use std::path::PathBuf;

pub use report::{Removal, SynthesisReport, WriteOutcome};
pub use synthesizer::Synthesizer;
pub use template::{PACKAGE_PLACEHOLDER, Template, TextTemplate};

// Re-export core types for convenience
pub use pkginfo_core::{PackageEntry, PackageSet, SynthConfig, SynthError};

/// Synthesize into `output_root` with default settings.
pub fn synthesize<T>(
    packages: &PackageSet,
    output_root: impl Into<PathBuf>,
    template: &T,
) -> Result<SynthesisReport, SynthError>
where
    T: Template + ?Sized,
{
    Synthesizer::new(SynthConfig::new(output_root)).synthesize(packages, template)
}
