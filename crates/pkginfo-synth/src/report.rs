//! Synthesis results.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use strum::Display;

/// What happened, or would happen, to a declaration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    /// The file did not exist.
    Created,
    /// The file existed with different content.
    Updated,
    /// The file already had the desired content.
    Unchanged,
}

/// A file or directory removed from the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Summary of a synthesis run.
///
/// Returned by both [`Synthesizer::synthesize`](crate::Synthesizer::synthesize)
/// and the read-only [`Synthesizer::plan`](crate::Synthesizer::plan); for a plan
/// every entry describes a change that has not been made yet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SynthesisReport {
    /// Declaration files written for the first time.
    pub created: Vec<PathBuf>,
    /// Declaration files rewritten because their content drifted.
    pub updated: Vec<PathBuf>,
    /// Declaration files left untouched.
    pub unchanged: usize,
    /// Entries removed during cleanup, deepest first.
    pub removed: Vec<Removal>,
    pub duration: Duration,
}

impl SynthesisReport {
    pub(crate) fn record(&mut self, path: PathBuf, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created.push(path),
            WriteOutcome::Updated => self.updated.push(path),
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of files written.
    pub fn writes(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    /// Number of declaration files that exist after the run.
    pub fn declarations(&self) -> usize {
        self.writes() + self.unchanged
    }

    /// True when nothing was (or would be) written or removed.
    pub fn is_up_to_date(&self) -> bool {
        self.writes() == 0 && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_counts() {
        let mut report = SynthesisReport::default();
        assert!(report.is_up_to_date());

        report.record(PathBuf::from("a"), WriteOutcome::Created);
        report.record(PathBuf::from("b"), WriteOutcome::Unchanged);
        report.record(PathBuf::from("c"), WriteOutcome::Updated);

        assert_eq!(report.writes(), 2);
        assert_eq!(report.declarations(), 3);
        assert!(!report.is_up_to_date());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(WriteOutcome::Created.to_string(), "created");
        assert_eq!(WriteOutcome::Unchanged.to_string(), "unchanged");
    }
}
