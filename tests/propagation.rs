//! Integration tests for patch propagation over real git repositories.
//!
//! Each test builds a throwaway git repository of numbered tutorial
//! sources, makes an unstaged edit, and drives the propagation API end
//! to end. Tests skip gracefully when `git` or `patch` is unavailable.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use stepman::catalog::Catalog;
use stepman::propagate::{propagate, PropagateError};

// ============================================================================
// Fixtures
// ============================================================================

const STEP_BODY: &str = "fn main() {\n    one();\n    two();\n    three();\n}\n";

const DIVERGED_BODY: &str = "fn main() {\n    completely();\n    different();\n}\n";

fn tools_available() -> bool {
    which::which("git").is_ok() && which::which("patch").is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.email=steps@example.com", "-c", "user.name=steps"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn step_name(step: u32) -> String {
    format!("{}_step.rs", step)
}

/// Create a git repository with one committed file per requested step.
fn setup_repo(steps: &[u32]) -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--quiet"]);
    for &step in steps {
        std::fs::write(dir.path().join(step_name(step)), STEP_BODY).unwrap();
    }
    git(dir.path(), &["add", "-A"]);
    git(dir.path(), &["commit", "--quiet", "-m", "seed steps"]);
    dir
}

/// Make an unstaged edit to one step's file; returns the edited content.
fn edit_step(dir: &Path, step: u32) -> String {
    let edited = STEP_BODY.replace("two();", "two_fixed();");
    std::fs::write(dir.join(step_name(step)), &edited).unwrap();
    edited
}

fn content(dir: &Path, step: u32) -> String {
    std::fs::read_to_string(dir.join(step_name(step))).unwrap()
}

// ============================================================================
// Full propagation
// ============================================================================

#[test]
fn propagates_edit_to_every_later_step_in_range() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[0, 1, 2, 3, 4]);
    let edited = edit_step(repo.path(), 1);

    let catalog = Catalog::scan(repo.path()).unwrap();
    propagate(&catalog, 1, 4).unwrap();

    // Targets received the edit.
    for step in 2..=4 {
        assert_eq!(content(repo.path(), step), edited, "step {}", step);
    }
    // The starting source keeps its own edit; step 0 is not a target.
    assert_eq!(content(repo.path(), 1), edited);
    assert_eq!(content(repo.path(), 0), STEP_BODY);
}

#[test]
fn start_equals_end_is_a_noop() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[0, 1, 2, 3]);
    edit_step(repo.path(), 1);

    let catalog = Catalog::scan(repo.path()).unwrap();
    propagate(&catalog, 1, 1).unwrap();

    for step in 2..=3 {
        assert_eq!(content(repo.path(), step), STEP_BODY, "step {}", step);
    }
}

#[test]
fn largest_step_number_with_empty_range_is_a_noop() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[u32::MAX]);

    let catalog = Catalog::scan(repo.path()).unwrap();
    propagate(&catalog, u32::MAX, u32::MAX).unwrap();

    assert_eq!(content(repo.path(), u32::MAX), STEP_BODY);
}

#[test]
fn empty_payload_leaves_every_target_identical() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[0, 1, 2, 3]);
    // No unstaged edit anywhere.

    let catalog = Catalog::scan(repo.path()).unwrap();
    propagate(&catalog, 1, 3).unwrap();

    for step in 0..=3 {
        assert_eq!(content(repo.path(), step), STEP_BODY, "step {}", step);
    }
}

// ============================================================================
// Halt-on-failure
// ============================================================================

#[test]
fn halts_at_first_failed_application() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[0, 1, 2, 3, 4]);
    // Step 3 has diverged so far that the payload cannot apply.
    std::fs::write(repo.path().join(step_name(3)), DIVERGED_BODY).unwrap();
    git(repo.path(), &["add", "-A"]);
    git(repo.path(), &["commit", "--quiet", "-m", "diverge step 3"]);
    let edited = edit_step(repo.path(), 1);

    let catalog = Catalog::scan(repo.path()).unwrap();
    let err = propagate(&catalog, 1, 4).unwrap_err();

    match &err {
        PropagateError::PatchFailed { step, file, code } => {
            assert_eq!(*step, 3);
            assert_eq!(file, &step_name(3));
            assert_ne!(*code, 0);
        }
        other => panic!("expected PatchFailed, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);

    // Everything before the failure is patched, everything after is not.
    assert_eq!(content(repo.path(), 2), edited);
    assert_eq!(content(repo.path(), 3), DIVERGED_BODY);
    assert_eq!(content(repo.path(), 4), STEP_BODY);
}

#[test]
fn cleans_up_reject_artifacts_after_a_failure() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[1, 2]);
    std::fs::write(repo.path().join(step_name(2)), DIVERGED_BODY).unwrap();
    git(repo.path(), &["add", "-A"]);
    git(repo.path(), &["commit", "--quiet", "-m", "diverge step 2"]);
    edit_step(repo.path(), 1);

    let catalog = Catalog::scan(repo.path()).unwrap();
    let err = propagate(&catalog, 1, 2).unwrap_err();
    assert!(matches!(err, PropagateError::PatchFailed { step: 2, .. }));

    for suffix in ["orig", "rej"] {
        let side_file = repo.path().join(format!("{}.{}", step_name(2), suffix));
        assert!(!side_file.exists(), "{} left behind", side_file.display());
    }
}

// ============================================================================
// Missing steps
// ============================================================================

#[test]
fn missing_step_inside_range_halts_propagation() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[0, 1, 2, 4]);
    let edited = edit_step(repo.path(), 1);

    let catalog = Catalog::scan(repo.path()).unwrap();
    let err = propagate(&catalog, 1, 4).unwrap_err();
    assert!(matches!(err, PropagateError::MissingStep { step: 3 }));

    // Steps before the gap were patched; the step after it was not.
    assert_eq!(content(repo.path(), 2), edited);
    assert_eq!(content(repo.path(), 4), STEP_BODY);
}

#[test]
fn empty_payload_still_requires_every_step_in_range() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[1, 2, 4]);
    // No unstaged edit anywhere, so there is nothing to replay.

    let catalog = Catalog::scan(repo.path()).unwrap();
    let err = propagate(&catalog, 1, 4).unwrap_err();
    assert!(matches!(err, PropagateError::MissingStep { step: 3 }));
}

#[test]
fn missing_start_step_is_an_error() {
    if !tools_available() {
        return;
    }
    let repo = setup_repo(&[0, 1, 2]);

    let catalog = Catalog::scan(repo.path()).unwrap();
    let err = propagate(&catalog, 7, 9).unwrap_err();
    assert!(matches!(err, PropagateError::MissingStep { step: 7 }));
}
