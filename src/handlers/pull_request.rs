//! Handler for `pull_request` (and review comment) events.
//!
//! `opened`/`created` take the create-or-link path; `edited`/`closed` take
//! update-or-create. When a newly opened pull request references no issue
//! at all and auto-creation is enabled, a bare issue is created from the PR
//! title and linked instead.

use tracing::debug;

use crate::config::BridgeConfig;
use crate::store::TrackerStore;
use crate::types::IssueId;
use crate::webhooks::events::{PrAction, PullRequestEvent};

use super::{reconcile, HandlerError};

/// Handles a pull request event.
pub fn handle_pull_request(
    event: &PullRequestEvent,
    store: &mut dyn TrackerStore,
    config: &BridgeConfig,
) -> Result<(), HandlerError> {
    let mut issue_ids: Vec<IssueId> = event.issue_refs().iter().map(|r| r.id).collect();

    if issue_ids.is_empty() {
        // Only a newly opened PR may fabricate an issue, and only when the
        // deployment opted in.
        if event.action == PrAction::Opened && config.auto_create_issue {
            let issue = store.create_issue(&event.title)?;
            debug!(pr = %event.number, issue = %issue, "auto-created issue for unmatched PR");
            issue_ids.push(issue);
        } else {
            debug!(pr = %event.number, "no issue references; nothing to reconcile");
            return Ok(());
        }
    }

    let title = (!event.title.is_empty()).then_some(event.title.as_str());

    match event.action {
        PrAction::Opened | PrAction::Created => {
            reconcile::create_or_link(store, event.number, title, event.status, &issue_ids)
        }
        PrAction::Edited | PrAction::Closed => {
            reconcile::update_or_create(store, event.number, title, event.status, &issue_ids)
        }
    }
}
