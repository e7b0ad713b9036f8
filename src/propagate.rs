//! Patch propagation across a step range.
//!
//! Captures the unstaged working-tree diff of a starting step and
//! replays it, in increasing step order, onto every step in the
//! requested range. The payload is computed once and reused verbatim for
//! every target, so cumulative drift across a long range raises the odds
//! of a later application failing. The first failure halts the run;
//! steps after it are left untouched.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::catalog::Catalog;

/// Errors from patch propagation.
#[derive(Debug, Error)]
pub enum PropagateError {
    /// A requested step number has no catalogued file.
    #[error("no source file for step {step}")]
    MissingStep { step: u32 },

    /// An external tool is not installed or not on PATH.
    #[error("'{tool}' not found on PATH")]
    ToolNotFound { tool: &'static str },

    /// Computing the payload failed (e.g. the source directory is not
    /// inside a git working tree).
    #[error("git diff of '{file}' failed: {message}")]
    DiffFailed { file: String, message: String },

    /// The patch tool reported a failed application.
    #[error("patch failed to apply to step {step} ('{file}'), exit code {code}")]
    PatchFailed { step: u32, file: String, code: i32 },

    /// Spawning or talking to an external tool failed.
    #[error("failed to run external tool: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for propagation operations.
pub type PropagateResult<T> = Result<T, PropagateError>;

impl PropagateError {
    /// Exit code the process should terminate with for this error.
    ///
    /// A failed application propagates the patch tool's own status so
    /// scripted callers can detect partial propagation; everything else
    /// is a generic failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            PropagateError::PatchFailed { code, .. } => (*code).clamp(1, u8::MAX as i32) as u8,
            _ => 1,
        }
    }
}

/// Replay the unstaged edit of `start` onto every step in `[start + 1, end]`.
///
/// The payload is git's view of the starting file's uncommitted changes;
/// a change that has already been committed yields an empty payload and
/// nothing is patched, though every step in the range must still exist.
/// Targets are patched strictly in increasing step order and the first
/// failure halts the run, so every step before it is patched and every
/// step after it is untouched.
///
/// An inverted or single-step range (`end <= start`) is a no-op.
///
/// # Errors
///
/// - `MissingStep` if `start` has no catalogued file, or a step inside
///   the range has none once the replay reaches it (with an empty
///   payload the whole range is checked before returning)
/// - `ToolNotFound` if `git` (or, for a non-empty range, `patch`) is not
///   on PATH
/// - `DiffFailed` if git cannot produce the payload
/// - `PatchFailed` on the first target the payload does not apply to
pub fn propagate(catalog: &Catalog, start: u32, end: u32) -> PropagateResult<()> {
    let start_file = catalog
        .file_for(start)
        .ok_or(PropagateError::MissingStep { step: start })?;

    let git = which::which("git").map_err(|_| PropagateError::ToolNotFound { tool: "git" })?;
    let payload = unstaged_diff(&git, catalog, start_file)?;

    if end <= start {
        tracing::debug!(
            "empty propagation range ({}..={}), nothing to do",
            start.saturating_add(1),
            end
        );
        return Ok(());
    }
    if payload.is_empty() {
        // A zero-hunk payload patches nothing, but the range is still
        // walked: an incomplete range is a caller error either way.
        for step in start + 1..=end {
            if !catalog.contains(step) {
                return Err(PropagateError::MissingStep { step });
            }
        }
        tracing::debug!("no unstaged changes in '{}', nothing to propagate", start_file);
        return Ok(());
    }

    // Resolved before any target is touched.
    let patch_tool =
        which::which("patch").map_err(|_| PropagateError::ToolNotFound { tool: "patch" })?;

    for step in start + 1..=end {
        let target = catalog
            .file_for(step)
            .ok_or(PropagateError::MissingStep { step })?;
        apply_payload(&patch_tool, catalog, &payload, step, target)?;
    }

    tracing::info!(
        "propagated '{}' edit to steps {}..={}",
        start_file,
        start + 1,
        end
    );
    Ok(())
}

/// Capture the unstaged working-tree diff of `file` as a byte payload.
fn unstaged_diff(git: &Path, catalog: &Catalog, file: &str) -> PropagateResult<Vec<u8>> {
    let output = Command::new(git)
        .args(["diff", file])
        .current_dir(catalog.dir())
        .output()?;
    if !output.status.success() {
        return Err(PropagateError::DiffFailed {
            file: file.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Force-apply the payload to one target file.
///
/// `.orig` and `.rej` side files are removed best-effort regardless of
/// the outcome; the patch tool's exit status is the only verdict.
fn apply_payload(
    patch_tool: &Path,
    catalog: &Catalog,
    payload: &[u8],
    step: u32,
    target: &str,
) -> PropagateResult<()> {
    tracing::debug!("applying payload to step {} ('{}')", step, target);

    let mut child = Command::new(patch_tool)
        .args(["-f", target])
        .current_dir(catalog.dir())
        .stdin(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        // patch can exit before draining its input; the exit status is
        // what matters, not the pipe.
        let _ = stdin.write_all(payload);
    }
    let status = child.wait()?;

    let _ = fs::remove_file(catalog.dir().join(format!("{}.orig", target)));
    let _ = fs::remove_file(catalog.dir().join(format!("{}.rej", target)));

    if !status.success() {
        return Err(PropagateError::PatchFailed {
            step,
            file: target.to_string(),
            code: status.code().unwrap_or(1),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
