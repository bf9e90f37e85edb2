//! Handler for `issue_comment` events.
//!
//! Comments only matter when the commented issue itself represents a pull
//! request (its payload carries a pull-request URL). Comment events have no
//! update path and carry no PR title or state: reconciliation is
//! create-or-link with null details.

use tracing::debug;

use crate::config::BridgeConfig;
use crate::store::TrackerStore;
use crate::types::{IssueId, LinkStatus};
use crate::webhooks::events::IssueCommentEvent;

use super::{reconcile, HandlerError};

/// Handles an issue comment event.
pub fn handle_issue_comment(
    event: &IssueCommentEvent,
    store: &mut dyn TrackerStore,
    _config: &BridgeConfig,
) -> Result<(), HandlerError> {
    let Some(number) = event.pr_number() else {
        // A comment on a plain issue; nothing to reconcile.
        debug!("comment's issue carries no pull-request URL; ignoring");
        return Ok(());
    };

    let issue_ids: Vec<IssueId> = event.issue_refs().iter().map(|r| r.id).collect();
    if issue_ids.is_empty() {
        debug!(pr = %number, "no issue references in comment; nothing to reconcile");
        return Ok(());
    }

    // Comment events carry no PR state, so title and status stay null.
    reconcile::create_or_link(store, number, None, LinkStatus::Unset, &issue_ids)
}
