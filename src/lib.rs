//! Stepman: sequencing and propagation for numbered tutorial sources.
//!
//! Tutorial sources are ordinary files named `<step>_<description>.<ext>`
//! whose numeric prefix fixes their position in a linear progression.
//! Stepman offers two operations over a directory of such files:
//!
//! - [`compare::generate_diffs`] writes a unified diff between every
//!   consecutive pair of steps, for review or documentation.
//! - [`propagate::propagate`] replays the unstaged edit of one step onto
//!   every later step in a range, so a correction made once does not have
//!   to be re-applied by hand N times.
//!
//! Diff computation and patch application are delegated to `git` and
//! `patch`; nothing here implements diffing or hunk matching itself.

pub mod catalog;
pub mod compare;
pub mod propagate;
