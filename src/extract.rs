//! Extraction of tracker issue references from free-form text.
//!
//! Two grammars live here:
//!
//! - the bare `bpo NNN` token, used for pull-request and comment title/body
//!   text; it never carries close intent
//! - the optional close verb followed by `#`, `issue`, or `bug` and a number,
//!   used for commit messages; the presence of the verb marks close intent
//!
//! Both are case-insensitive. Within one scan, duplicate issue ids collapse
//! to a single reference and the first match's intent wins.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::types::{IssueId, PrNumber};

/// A parsed (issue id, close intent) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueRef {
    /// The referenced tracker issue.
    pub id: IssueId,
    /// Whether the reference carried an explicit close verb.
    pub close: bool,
}

static TRACKER_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bpo\s*(\d+)").expect("tracker reference pattern is valid"));

// The verb alternation is ordered longest-first so "closes"/"closed" are not
// consumed as "close" plus a stray letter.
static COMMIT_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\b(?P<verb>closes|closed|closing|close)\s+)?(?:#|\bissue|\bbug)\s*(?P<id>\d+)")
        .expect("commit reference pattern is valid")
});

static PR_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://github\.com/[^/\s]+/[^/\s]+/pull/(?P<number>\d+)")
        .expect("pull request URL pattern is valid")
});

/// Scans pull-request/comment text for `bpo NNN` references.
///
/// The returned references are in first-occurrence order, deduplicated by
/// issue id, and never carry close intent.
///
/// # Examples
///
/// ```
/// use tracker_bridge::extract::tracker_refs;
/// use tracker_bridge::types::IssueId;
///
/// let refs = tracker_refs("Fixes bpo12345, see also BPO 678. bpo12345 again.");
/// let ids: Vec<IssueId> = refs.iter().map(|r| r.id).collect();
/// assert_eq!(ids, vec![IssueId(12345), IssueId(678)]);
/// assert!(refs.iter().all(|r| !r.close));
/// ```
pub fn tracker_refs(text: &str) -> Vec<IssueRef> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for captures in TRACKER_REF_RE.captures_iter(text) {
        let Ok(id) = captures[1].parse::<u64>() else {
            continue;
        };
        let id = IssueId(id);
        if seen.insert(id) {
            refs.push(IssueRef { id, close: false });
        }
    }
    refs
}

/// Scans a commit message for verb + marker issue references.
///
/// A reference like `closes #42` or `Closing issue 42` carries close intent;
/// a bare `#42`, `issue 42`, or `bug 42` does not. Duplicate ids within the
/// same message collapse to the first match.
///
/// # Examples
///
/// ```
/// use tracker_bridge::extract::commit_refs;
/// use tracker_bridge::types::IssueId;
///
/// let refs = commit_refs("Closes #10: fix the frobnicator (see bug 20)");
/// assert_eq!(refs.len(), 2);
/// assert_eq!((refs[0].id, refs[0].close), (IssueId(10), true));
/// assert_eq!((refs[1].id, refs[1].close), (IssueId(20), false));
/// ```
pub fn commit_refs(text: &str) -> Vec<IssueRef> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for captures in COMMIT_REF_RE.captures_iter(text) {
        let Ok(id) = captures["id"].parse::<u64>() else {
            continue;
        };
        let id = IssueId(id);
        if seen.insert(id) {
            refs.push(IssueRef {
                id,
                close: captures.name("verb").is_some(),
            });
        }
    }
    refs
}

/// Extracts the pull request number from a GitHub pull-request HTML URL.
///
/// Returns `None` when the text holds no such URL.
pub fn pr_number_from_url(url: &str) -> Option<PrNumber> {
    let captures = PR_URL_RE.captures(url)?;
    captures["number"].parse::<u64>().ok().map(PrNumber)
}
