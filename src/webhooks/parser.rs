//! Webhook payload parser.
//!
//! This module parses raw webhook JSON payloads into typed [`BridgeEvent`]
//! values. The parser is designed to be robust against unknown fields and
//! event types.
//!
//! # Parsing Strategy
//!
//! 1. The event type string comes from the event-type header
//! 2. The payload is parsed according to the event type
//! 3. Unknown event types return `Ok(None)` (acknowledged, not an error)
//! 4. Malformed payloads return `Err` with details
//!
//! Raw deserialization structs use `Option<T>` liberally, then validate
//! required fields explicitly.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{LinkStatus, PrNumber};

use super::events::{
    BridgeEvent, CommentAction, IssueCommentEvent, PrAction, PullRequestEvent, PushEvent,
    PushedCommit,
};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes type mismatches).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A field required by the event type is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Parses a webhook payload into a typed event.
///
/// # Arguments
///
/// * `event_type` - The value of the event-type header
/// * `payload` - The raw JSON payload bytes
///
/// # Returns
///
/// * `Ok(Some(event))` - Successfully parsed a known event type
/// * `Ok(None)` - Unknown event type or irrelevant action (ignored)
/// * `Err(e)` - Malformed payload or missing required fields
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<BridgeEvent>, ParseError> {
    match event_type {
        // Review comment deliveries carry the same pull_request object and
        // take the same reconciliation path.
        "pull_request" | "pull_request_review_comment" => {
            parse_pull_request(payload).map(|opt| opt.map(BridgeEvent::PullRequest))
        }
        "issue_comment" => {
            parse_issue_comment(payload).map(|opt| opt.map(BridgeEvent::IssueComment))
        }
        "push" => parse_push(payload).map(|e| Some(BridgeEvent::Push(e))),
        // Unknown event types are acknowledged without any action
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawUser {
    login: Option<String>,
}

// ============================================================================
// pull_request / pull_request_review_comment events
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    #[serde(default)]
    action: String,
    pull_request: Option<RawPullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    title: Option<String>,
    body: Option<String>,
    state: Option<String>,
    merged: Option<bool>,
    user: Option<RawUser>,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "created" => PrAction::Created,
        "edited" => PrAction::Edited,
        "closed" => PrAction::Closed,
        // Other actions (synchronize, labeled, etc.) produce no tracker mutation
        _ => return Ok(None),
    };

    let pr = raw
        .pull_request
        .ok_or(ParseError::MissingField("pull_request"))?;
    let number = pr
        .number
        .ok_or(ParseError::MissingField("pull_request.number"))?;

    let merged = pr.merged.unwrap_or(false);
    let status = LinkStatus::from_state(pr.state.as_deref(), merged);

    Ok(Some(PullRequestEvent {
        action,
        number: PrNumber(number),
        title: pr.title.unwrap_or_default(),
        body: pr.body.unwrap_or_default(),
        status,
        author_login: pr.user.and_then(|u| u.login),
    }))
}

// ============================================================================
// issue_comment event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    #[serde(default)]
    action: String,
    issue: Option<RawIssue>,
    comment: Option<RawComment>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    title: Option<String>,
    user: Option<RawUser>,
    // Present iff the issue represents a pull request
    pull_request: Option<RawPrRef>,
}

#[derive(Debug, Deserialize)]
struct RawPrRef {
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: Option<String>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<Option<IssueCommentEvent>, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "created" => CommentAction::Created,
        "edited" => CommentAction::Edited,
        // Deleted comments leave the tracker untouched
        _ => return Ok(None),
    };

    let issue = raw.issue.ok_or(ParseError::MissingField("issue"))?;
    let comment = raw.comment.ok_or(ParseError::MissingField("comment"))?;

    Ok(Some(IssueCommentEvent {
        action,
        issue_title: issue.title.unwrap_or_default(),
        comment_body: comment.body.unwrap_or_default(),
        pr_url: issue.pull_request.and_then(|pr| pr.html_url),
        // Comment events are attributed to the issue author, not the commenter
        author_login: issue.user.and_then(|u| u.login),
    }))
}

// ============================================================================
// push event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref")]
    ref_name: Option<String>,
    pusher: Option<RawPusher>,
    #[serde(default)]
    commits: Vec<RawCommit>,
}

#[derive(Debug, Deserialize)]
struct RawPusher {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    id: Option<String>,
    message: Option<String>,
    url: Option<String>,
    committer: Option<RawCommitter>,
}

#[derive(Debug, Deserialize)]
struct RawCommitter {
    name: Option<String>,
}

fn parse_push(payload: &[u8]) -> Result<PushEvent, ParseError> {
    let raw: RawPushPayload = serde_json::from_slice(payload)?;

    let commits = raw
        .commits
        .into_iter()
        .map(|c| PushedCommit {
            id: c.id.unwrap_or_default(),
            message: c.message.unwrap_or_default(),
            url: c.url.unwrap_or_default(),
            committer_name: c.committer.and_then(|c| c.name).unwrap_or_default(),
        })
        .collect();

    Ok(PushEvent {
        ref_name: raw.ref_name,
        pusher_login: raw.pusher.and_then(|p| p.name),
        commits,
    })
}
