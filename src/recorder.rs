//! Verdict recorder: stale-artifact invalidation and atomic artifact writes.
//!
//! Artifact layout is a fixed two-part record:
//!
//! ```text
//! <PASS|FAIL> (<code>)
//! <raw response payload>
//! ```
//!
//! The artifact is written to a temporary file in the results directory and
//! renamed into place, so an observer sees either no artifact or a complete
//! one. A missing artifact after a run means the run aborted before the
//! assertion was recorded.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SahError};
use crate::core::paths::artifact_path;
use crate::expectation::Verdict;

/// Immutable record of one run's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictRecord {
    /// PASS/FAIL outcome of the assertion.
    pub verdict: Verdict,
    /// Result code extracted from the command-under-test response.
    pub code: i64,
    /// Raw response payload, verbatim.
    pub raw_response: String,
}

impl VerdictRecord {
    /// Render the artifact body in its literal on-disk order.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{} ({})\n{}", self.verdict.label(), self.code, self.raw_response)
    }
}

/// Writes result artifacts keyed by scenario identity.
#[derive(Debug, Clone)]
pub struct VerdictRecorder {
    results_dir: PathBuf,
}

impl VerdictRecorder {
    /// Recorder rooted at a results directory.
    #[must_use]
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Path of the artifact for a scenario.
    #[must_use]
    pub fn path_for(&self, scenario: &str) -> PathBuf {
        artifact_path(&self.results_dir, scenario)
    }

    /// Remove any stale artifact for this scenario. Idempotent: succeeds
    /// when nothing existed.
    pub fn clear(&self, scenario: &str) -> Result<()> {
        let path = self.path_for(scenario);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SahError::io(path, e)),
        }
    }

    /// Persist a verdict record, replacing whatever was there.
    ///
    /// Returns the artifact path.
    pub fn record(&self, scenario: &str, record: &VerdictRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.results_dir)
            .map_err(|e| SahError::io(&self.results_dir, e))?;

        let path = self.path_for(scenario);
        let tmp = path.with_extension("result.tmp");

        write_all(&tmp, record.render().as_bytes())?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            SahError::io(&path, e)
        })?;
        Ok(path)
    }
}

fn write_all(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|e| SahError::io(path, e))?;
    file.write_all(bytes).map_err(|e| SahError::io(path, e))?;
    file.sync_all().map_err(|e| SahError::io(path, e))?;
    Ok(())
}
