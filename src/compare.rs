//! Consecutive step diff generation.
//!
//! Runs `git diff --no-index` over every adjacent pair of steps in the
//! catalog and writes one `diff_<n>_<n+1>.diff` artifact per pair into
//! the source directory. The batch is best-effort: the diffs are a
//! convenience artifact, so a failing pair is recorded and logged but
//! never aborts the remaining pairs.

use std::process::Command;

use crate::catalog::Catalog;

/// Outcome of one adjacent pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// The artifact was written (the two files may or may not differ).
    Written { artifact: String },
    /// One side of the pair has no catalogued file; the pair was skipped.
    SkippedGap,
    /// The diff tool could not be run, or reported an error.
    Failed { message: String },
}

/// Per-pair results of one compare run.
///
/// Each entry is keyed by the lower step of the pair, in ascending order.
#[derive(Debug, Default)]
pub struct CompareReport {
    outcomes: Vec<(u32, PairOutcome)>,
}

impl CompareReport {
    /// All pair outcomes, keyed by the lower step of each pair.
    pub fn outcomes(&self) -> &[(u32, PairOutcome)] {
        &self.outcomes
    }

    /// Number of artifacts written.
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Written { .. }))
    }

    /// Number of pairs skipped because of catalog gaps.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::SkippedGap))
    }

    /// Number of pairs whose diff failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&PairOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Generate a diff artifact for every adjacent pair of steps.
///
/// Walks step numbers from the catalog's minimum to one below its
/// maximum; pairs with a gap on either side are skipped. Never fails as
/// a whole — consult the returned [`CompareReport`] for per-pair
/// outcomes. Existing artifacts are overwritten.
pub fn generate_diffs(catalog: &Catalog) -> CompareReport {
    let mut report = CompareReport::default();
    for step in catalog.min_step()..catalog.max_step() {
        let outcome = diff_pair(catalog, step);
        match &outcome {
            PairOutcome::Written { artifact } => {
                tracing::debug!("wrote {}", artifact);
            }
            PairOutcome::SkippedGap => {
                tracing::debug!("no pair for steps {} and {}, skipping", step, step + 1);
            }
            PairOutcome::Failed { message } => {
                tracing::warn!("diff of steps {} and {} failed: {}", step, step + 1, message);
            }
        }
        report.outcomes.push((step, outcome));
    }
    report
}

/// Diff `file(step)` against `file(step + 1)` into the pair's artifact.
fn diff_pair(catalog: &Catalog, step: u32) -> PairOutcome {
    let (this, that) = match (catalog.file_for(step), catalog.file_for(step + 1)) {
        (Some(this), Some(that)) => (this, that),
        _ => return PairOutcome::SkippedGap,
    };

    let artifact = format!("diff_{}_{}.diff", step, step + 1);
    let result = Command::new("git")
        .args(["diff", "--no-index"])
        .arg(format!("--output={}", artifact))
        .args([this, that])
        .current_dir(catalog.dir())
        .output();

    match result {
        // --no-index exits 1 when the files differ; the artifact is
        // written either way.
        Ok(output) if matches!(output.status.code(), Some(0) | Some(1)) => {
            PairOutcome::Written { artifact }
        }
        Ok(output) => PairOutcome::Failed {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
        Err(err) => PairOutcome::Failed {
            message: err.to_string(),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
