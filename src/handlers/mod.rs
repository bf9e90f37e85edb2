//! Event handlers: the reconciliation side of the bridge.
//!
//! [`handle_event`] is the single entry point for an authenticated, parsed
//! delivery. It resolves the event actor to a tracker identity (impersonated
//! for every store mutation in the delivery), then dispatches on the event
//! variant. Dispatch is a closed match: each variant drives the same
//! protocol of extracting issue references and pull-request details before
//! applying its action.
//!
//! All handler paths are idempotent under redelivery; see
//! [`reconcile`] for the create-or-skip rules.

pub mod issue_comment;
pub mod pull_request;
pub mod push;
pub mod reconcile;

use thiserror::Error;
use tracing::debug;

use crate::config::BridgeConfig;
use crate::store::{StoreError, TrackerStore};
use crate::webhooks::events::BridgeEvent;

pub use issue_comment::handle_issue_comment;
pub use pull_request::handle_pull_request;
pub use push::handle_push;

/// Errors that can occur during event handling.
///
/// All variants are terminal for the delivery and surface to the sender as
/// a rejection; redelivery is safe.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A handler-level precondition failed.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The tracker store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handles one parsed webhook event against a store session.
///
/// The session must be fresh for this delivery; impersonation set here does
/// not outlive it.
pub fn handle_event(
    event: &BridgeEvent,
    store: &mut dyn TrackerStore,
    config: &BridgeConfig,
) -> Result<(), HandlerError> {
    impersonate(store, event.actor_login(), config)?;

    match event {
        BridgeEvent::PullRequest(e) => handle_pull_request(e, store, config),
        BridgeEvent::IssueComment(e) => handle_issue_comment(e, store, config),
        BridgeEvent::Push(e) => handle_push(e, store, config),
    }
}

/// Resolves the event actor to a tracker identity and sets it on the session.
///
/// Fallback chain: tracker user mapped to the platform login, else the
/// configured fallback user, else anonymous.
fn impersonate(
    store: &mut dyn TrackerStore,
    login: Option<&str>,
    config: &BridgeConfig,
) -> Result<(), HandlerError> {
    if let Some(login) = login {
        if let Some(identity) = store.resolve_user_by_external_login(login)? {
            debug!(login, %identity, "impersonating mapped user");
            store.set_current_identity(identity);
            return Ok(());
        }
    }

    if let Some(identity) = store.resolve_user_by_name(&config.fallback_username)? {
        debug!(%identity, "impersonating fallback user");
        store.set_current_identity(identity);
    } else {
        // Whether anonymous mutations are permitted is the permission
        // engine's decision, not ours.
        debug!("no fallback user; proceeding anonymously");
    }
    Ok(())
}
