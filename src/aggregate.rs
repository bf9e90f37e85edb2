//! Per-push aggregation of commit message effects.
//!
//! Push handling is two-phase: this module is the pure build phase. Each
//! commit message is scanned for issue references and rendered into a
//! comment block; a [`PushAccumulator`] then folds all commits of one push
//! into a single update per issue (comment blocks concatenated in commit
//! order, close flags OR-combined). The apply phase
//! ([`crate::handlers::push`]) consumes the accumulator against the store.

use std::collections::BTreeMap;

use crate::extract::commit_refs;
use crate::types::IssueId;
use crate::webhooks::events::{PushEvent, PushedCommit};

/// The merged update a push produces for one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueUpdate {
    /// Comment blocks for every referencing commit, oldest first,
    /// newline-joined.
    pub text: String,
    /// True when at least one referencing commit carried close intent.
    pub close: bool,
}

/// Renders the comment block recorded for one commit.
///
/// The block names the changeset, its author, the branch, the first line of
/// the commit message, and the changeset URL.
pub fn render_comment(commit: &PushedCommit, branch: &str) -> String {
    let first_line = commit.message.lines().next().unwrap_or("");
    format!(
        "New changeset {changeset_id} by {author} in branch '{branch}':\n\
         {commit_msg}\n\
         {changeset_url}\n",
        changeset_id = commit.id,
        author = commit.committer_name,
        branch = branch,
        commit_msg = first_line,
        changeset_url = commit.url,
    )
}

/// Scans one commit, producing its per-issue (comment, close) effects.
///
/// Duplicate issue ids within the same commit message collapse to one entry
/// with the first match's intent.
pub fn commit_effects(commit: &PushedCommit, branch: &str) -> Vec<(IssueId, String, bool)> {
    commit_refs(&commit.message)
        .into_iter()
        .map(|r| (r.id, render_comment(commit, branch), r.close))
        .collect()
}

/// The folded result of one push: one pending update per referenced issue.
///
/// Built once per push, consumed once, then discarded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushAccumulator {
    entries: BTreeMap<IssueId, IssueUpdate>,
}

impl PushAccumulator {
    /// Folds every commit of a push, in payload order, into per-issue updates.
    pub fn build(push: &PushEvent) -> Self {
        let branch = push.branch();
        let mut acc = PushAccumulator::default();
        for commit in &push.commits {
            for (issue_id, comment, close) in commit_effects(commit, branch) {
                acc.record(issue_id, comment, close);
            }
        }
        acc
    }

    /// Records one commit's effect for an issue, merging with anything
    /// already accumulated for it.
    fn record(&mut self, issue_id: IssueId, comment: String, close: bool) {
        self.entries
            .entry(issue_id)
            .and_modify(|update| {
                update.text.push('\n');
                update.text.push_str(&comment);
                update.close |= close;
            })
            .or_insert(IssueUpdate {
                text: comment,
                close,
            });
    }

    /// True when no commit referenced any issue.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the accumulated updates in issue-id order.
    pub fn iter(&self) -> impl Iterator<Item = (IssueId, &IssueUpdate)> {
        self.entries.iter().map(|(id, update)| (*id, update))
    }
}
