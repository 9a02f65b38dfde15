//! Superscalar commit reordering.
//!
//! Out-of-order or multi-issue cores may retire register writes in a
//! different order than program order while producing the same net effect.
//! A short bounded lookahead over the commit stream recovers the common
//! cases; anything further away is left alone and surfaces as a mismatch.

use crate::trace::RegCommit;

/// Result of looking for an expected commit in the lookahead window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    /// The commit at the cursor already matches.
    InPlace,
    /// A match was found `offset` positions past the cursor.
    Found { offset: usize },
    /// No match inside the window; the stream is left unchanged.
    NotFound,
}

/// Search `commits[at..at + window]` for `expected`.
///
/// Pure: the caller decides whether to apply the swap.
pub fn find_commit(commits: &[RegCommit], at: usize, expected: RegCommit, window: usize) -> Reorder {
    let end = at.saturating_add(window).min(commits.len());
    let Some(candidates) = commits.get(at..end) else {
        return Reorder::NotFound;
    };
    match candidates.iter().position(|&c| c == expected) {
        Some(0) => Reorder::InPlace,
        Some(offset) => Reorder::Found { offset },
        None => Reorder::NotFound,
    }
}

/// Bring `expected` to position `at` if it appears within the window.
///
/// The displaced commit takes the matched commit's old slot, so no
/// observation is lost.
pub fn reorder_commits(
    commits: &mut [RegCommit],
    at: usize,
    expected: RegCommit,
    window: usize,
) -> Reorder {
    let result = find_commit(commits, at, expected, window);
    if let Reorder::Found { offset } = result {
        commits.swap(at, at + offset);
    }
    result
}
