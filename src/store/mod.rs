//! The tracker-store boundary.
//!
//! The bridge never owns tracker data; it requests mutations through the
//! [`TrackerStore`] trait. A store session lives for exactly one delivery:
//! the router opens it, sets the impersonated identity on it, the handlers
//! mutate through it, and `commit()` flushes everything as one logical unit.
//! The store is expected to provide read-your-writes consistency within one
//! session (a just-created link is visible to a subsequent existence check in
//! the same delivery).
//!
//! [`memory::MemoryStore`] is the in-process implementation; a deployment
//! against a real tracker supplies its own.

pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{Identity, IssueId, LinkId, LinkStatus, MessageId};

/// Errors surfaced by store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced issue does not exist.
    #[error("no such issue: {0}")]
    NoSuchIssue(IssueId),

    /// The referenced link does not exist.
    #[error("no such link: {0}")]
    NoSuchLink(LinkId),

    /// The enum domain has no value with the given name.
    #[error("unknown {domain} value: {name}")]
    UnknownEnumValue {
        domain: EnumDomain,
        name: String,
    },

    /// The underlying store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Symbolic-value domains the tracker exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumDomain {
    /// Issue status (open, closed, ...).
    Status,
    /// Issue resolution (fixed, wontfix, ...).
    Resolution,
    /// Issue workflow stage (needs patch, resolved, ...).
    Stage,
}

impl std::fmt::Display for EnumDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnumDomain::Status => "status",
            EnumDomain::Resolution => "resolution",
            EnumDomain::Stage => "stage",
        };
        write!(f, "{}", name)
    }
}

/// A resolved symbolic value within an [`EnumDomain`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue(pub String);

/// A pull-request link record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestLink {
    /// The stable external id (PR number as a string).
    pub number: String,
    /// The PR title, when known.
    pub title: Option<String>,
    /// The last reconciled status.
    pub status: LinkStatus,
}

/// One tracker-store session, scoped to a single delivery.
///
/// Mutations stay pending until [`commit`](TrackerStore::commit); a session
/// dropped without committing leaves no durable state.
pub trait TrackerStore: Send {
    /// Filters the given issue ids down to those that exist.
    fn find_issues(&self, ids: &[IssueId]) -> Result<Vec<IssueId>, StoreError>;

    /// Creates a bare issue with the given title; used only by the
    /// auto-create path for unmatched pull requests.
    fn create_issue(&mut self, title: &str) -> Result<IssueId, StoreError>;

    /// Returns the link ids attached to an issue.
    fn issue_links(&self, issue: IssueId) -> Result<Vec<LinkId>, StoreError>;

    /// Replaces the link ids attached to an issue.
    fn set_issue_links(&mut self, issue: IssueId, links: Vec<LinkId>) -> Result<(), StoreError>;

    /// Returns the message ids attached to an issue.
    fn issue_messages(&self, issue: IssueId) -> Result<Vec<MessageId>, StoreError>;

    /// Replaces the message ids attached to an issue.
    fn set_issue_messages(
        &mut self,
        issue: IssueId,
        messages: Vec<MessageId>,
    ) -> Result<(), StoreError>;

    /// Sets one symbolic field on an issue.
    fn set_issue_enum(
        &mut self,
        issue: IssueId,
        domain: EnumDomain,
        value: EnumValue,
    ) -> Result<(), StoreError>;

    /// Finds link ids whose external number matches.
    fn find_links_by_number(&self, number: &str) -> Result<Vec<LinkId>, StoreError>;

    /// Creates a link record and returns its id.
    fn create_link(
        &mut self,
        number: &str,
        title: Option<&str>,
        status: LinkStatus,
    ) -> Result<LinkId, StoreError>;

    /// Reads one link record.
    fn get_link(&self, link: LinkId) -> Result<PullRequestLink, StoreError>;

    /// Updates title and status of one link record.
    fn set_link(
        &mut self,
        link: LinkId,
        title: Option<&str>,
        status: LinkStatus,
    ) -> Result<(), StoreError>;

    /// Creates a message record and returns its id.
    fn create_message(
        &mut self,
        content: &str,
        author: &Identity,
        timestamp: DateTime<Utc>,
    ) -> Result<MessageId, StoreError>;

    /// Resolves a symbolic value by name within a domain.
    fn lookup_enum(&self, domain: EnumDomain, name: &str) -> Result<EnumValue, StoreError>;

    /// Resolves the tracker user mapped to an external platform login.
    fn resolve_user_by_external_login(
        &self,
        login: &str,
    ) -> Result<Option<Identity>, StoreError>;

    /// Resolves a tracker user by internal username (the fallback identity).
    fn resolve_user_by_name(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    /// Sets the identity subsequent mutations in this session run as.
    fn set_current_identity(&mut self, identity: Identity);

    /// Returns the identity this session currently runs as.
    fn current_identity(&self) -> &Identity;

    /// Flushes all pending mutations of this session as one logical unit.
    fn commit(&mut self) -> Result<(), StoreError>;
}

/// Opens per-delivery store sessions.
///
/// The server holds one factory; each delivery gets its own session so
/// impersonation never leaks between concurrently processed deliveries.
pub trait TrackerStoreFactory: Send + Sync {
    /// Opens a fresh session with anonymous identity.
    fn open_session(&self) -> Box<dyn TrackerStore>;
}
