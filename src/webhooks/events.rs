//! Typed webhook event representations.
//!
//! This module defines the event variants the bridge reconciles against the
//! tracker. Each variant corresponds to a webhook event type, carrying only
//! the fields the handlers consume. Unknown or irrelevant events are
//! represented by the parser returning `None`.

use serde::{Deserialize, Serialize};

use crate::extract::{self, IssueRef};
use crate::types::{LinkStatus, PrNumber};

/// A parsed webhook event.
///
/// Dispatch over this enum is a closed match: every variant implements the
/// same handler protocol (actor login, issue references, PR details) and the
/// router drives them uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// A pull request was opened, edited, or closed (also covers review
    /// comment deliveries, which carry the same `pull_request` object).
    PullRequest(PullRequestEvent),

    /// A comment was created or edited on an issue that represents a pull
    /// request.
    IssueComment(IssueCommentEvent),

    /// Commits were pushed to a branch.
    Push(PushEvent),
}

impl BridgeEvent {
    /// Returns the external platform login of the event's author, if the
    /// payload carried one.
    pub fn actor_login(&self) -> Option<&str> {
        match self {
            BridgeEvent::PullRequest(e) => e.author_login.as_deref(),
            BridgeEvent::IssueComment(e) => e.author_login.as_deref(),
            BridgeEvent::Push(e) => e.pusher_login.as_deref(),
        }
    }
}

/// Action performed on a pull request.
///
/// `Created` appears on review-comment deliveries; it takes the create path
/// like `Opened`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// A review comment was created on the PR.
    Created,
    /// PR title, body, or base changed.
    Edited,
    /// PR was closed (merged or not).
    Closed,
}

/// A pull request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub number: PrNumber,

    /// The PR title.
    pub title: String,

    /// The PR body text.
    ///
    /// Empty when the payload omitted it.
    pub body: String,

    /// The link status computed from the payload's state and merge flag.
    pub status: LinkStatus,

    /// The PR author's platform login.
    pub author_login: Option<String>,
}

impl PullRequestEvent {
    /// Issue references extracted from the PR title and body.
    pub fn issue_refs(&self) -> Vec<IssueRef> {
        let mut refs = extract::tracker_refs(&self.title);
        for r in extract::tracker_refs(&self.body) {
            if !refs.iter().any(|existing| existing.id == r.id) {
                refs.push(r);
            }
        }
        refs
    }
}

/// Action performed on an issue comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    /// Comment was created.
    Created,
    /// Comment was edited.
    Edited,
}

/// An issue comment event.
///
/// Only comments attached to an issue that itself represents a pull request
/// (the payload's issue carries a pull-request URL) lead to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    /// The action that triggered this event.
    pub action: CommentAction,

    /// Title of the issue the comment was made on.
    pub issue_title: String,

    /// The comment body text.
    pub comment_body: String,

    /// The HTML URL of the pull request the issue represents, if any.
    pub pr_url: Option<String>,

    /// The issue author's platform login.
    pub author_login: Option<String>,
}

impl IssueCommentEvent {
    /// Issue references extracted from the issue title and comment body.
    pub fn issue_refs(&self) -> Vec<IssueRef> {
        let mut refs = extract::tracker_refs(&self.issue_title);
        for r in extract::tracker_refs(&self.comment_body) {
            if !refs.iter().any(|existing| existing.id == r.id) {
                refs.push(r);
            }
        }
        refs
    }

    /// The pull request number parsed from the issue's pull-request URL.
    pub fn pr_number(&self) -> Option<PrNumber> {
        self.pr_url
            .as_deref()
            .and_then(extract::pr_number_from_url)
    }
}

/// One commit carried by a push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushedCommit {
    /// The changeset id (commit SHA).
    pub id: String,

    /// The full commit message.
    pub message: String,

    /// The changeset URL.
    pub url: String,

    /// The committer's display name.
    pub committer_name: String,
}

/// A push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// The pushed ref (e.g., "refs/heads/main"), when present.
    pub ref_name: Option<String>,

    /// The pusher's platform login.
    pub pusher_login: Option<String>,

    /// The pushed commits, in payload order (oldest first).
    pub commits: Vec<PushedCommit>,
}

impl PushEvent {
    /// Default ref assumed when the payload carries none.
    pub const DEFAULT_REF: &'static str = "refs/heads/master";

    /// The branch name: the final path segment of the ref.
    pub fn branch(&self) -> &str {
        let ref_name = self.ref_name.as_deref().unwrap_or(Self::DEFAULT_REF);
        ref_name.rsplit('/').next().unwrap_or(ref_name)
    }
}
