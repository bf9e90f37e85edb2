//! Handler for `push` events: the apply phase of push reconciliation.
//!
//! The pure build phase ([`PushAccumulator`]) folds all commits of the push
//! into one pending update per issue; this module applies that accumulator
//! against the store. Each referenced issue receives exactly one appended
//! message (the merged comment text), plus the closed/fixed/resolved
//! transition when any referencing commit carried close intent. The batch is
//! committed once, after all issues are processed.

use chrono::Utc;
use tracing::{debug, warn};

use crate::aggregate::PushAccumulator;
use crate::config::BridgeConfig;
use crate::store::{EnumDomain, TrackerStore};
use crate::webhooks::events::PushEvent;

use super::HandlerError;

/// Handles a push event.
///
/// A push referencing no issue is a no-op success. An issue id that does
/// not resolve is skipped without failing the rest of the push.
pub fn handle_push(
    event: &PushEvent,
    store: &mut dyn TrackerStore,
    _config: &BridgeConfig,
) -> Result<(), HandlerError> {
    let accumulator = PushAccumulator::build(event);
    if accumulator.is_empty() {
        debug!("push references no issues; nothing to do");
        return Ok(());
    }

    let mut mutated = false;
    for (issue_id, update) in accumulator.iter() {
        if store.find_issues(&[issue_id])?.is_empty() {
            warn!(issue = %issue_id, "push references unknown issue; skipping");
            continue;
        }

        // One merged message per issue, regardless of how many commits
        // referenced it.
        let author = store.current_identity().clone();
        let message = store.create_message(&update.text, &author, Utc::now())?;
        let mut messages = store.issue_messages(issue_id)?;
        messages.push(message);
        store.set_issue_messages(issue_id, messages)?;

        if update.close {
            let closed = store.lookup_enum(EnumDomain::Status, "closed")?;
            store.set_issue_enum(issue_id, EnumDomain::Status, closed)?;
            let fixed = store.lookup_enum(EnumDomain::Resolution, "fixed")?;
            store.set_issue_enum(issue_id, EnumDomain::Resolution, fixed)?;
            let resolved = store.lookup_enum(EnumDomain::Stage, "resolved")?;
            store.set_issue_enum(issue_id, EnumDomain::Stage, resolved)?;
            debug!(issue = %issue_id, "closed by push");
        }
        mutated = true;
    }

    if mutated {
        store.commit()?;
    }
    Ok(())
}
