//! In-memory tracker store.
//!
//! Sessions are snapshot-isolated: opening a session clones the shared
//! state, mutations apply to the session's working copy (giving
//! read-your-writes within a delivery), and `commit()` replays the
//! session's change set onto the live shared state under the lock. Record
//! ids are allocated from the shared counters, so concurrently committed
//! sessions never collide and never erase each other's records; a
//! conflicting write to the same field of the same record resolves
//! last-committer-wins. A session dropped without committing leaves the
//! shared state untouched, which matches the all-or-nothing commit
//! contract.
//!
//! This backs the binary and the handler/server tests; a deployment against
//! a real tracker implements [`TrackerStore`] over its own storage instead.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::types::{Identity, IssueId, LinkId, LinkStatus, MessageId};

use super::{
    EnumDomain, EnumValue, PullRequestLink, StoreError, TrackerStore, TrackerStoreFactory,
};

/// A message record, exposed for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// The comment text.
    pub content: String,
    /// The identity the message was created as.
    pub author: Identity,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct IssueRecord {
    title: String,
    status: Option<EnumValue>,
    resolution: Option<EnumValue>,
    stage: Option<EnumValue>,
    links: Vec<LinkId>,
    messages: Vec<MessageId>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    external_login: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Inner {
    issues: BTreeMap<IssueId, IssueRecord>,
    links: BTreeMap<LinkId, PullRequestLink>,
    messages: BTreeMap<MessageId, MessageRecord>,
    users: Vec<UserRecord>,
    next_issue: u64,
    next_link: u64,
    next_message: u64,
}

impl Inner {
    fn issue(&self, id: IssueId) -> Result<&IssueRecord, StoreError> {
        self.issues.get(&id).ok_or(StoreError::NoSuchIssue(id))
    }

    fn issue_mut(&mut self, id: IssueId) -> Result<&mut IssueRecord, StoreError> {
        self.issues.get_mut(&id).ok_or(StoreError::NoSuchIssue(id))
    }
}

/// The shared in-memory store.
///
/// Cloning is cheap; all clones observe the same committed state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Mutex poisoning only happens if a holder panicked; recover the data
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seeds an issue and returns its id. Fixture helper.
    pub fn add_issue(&self, title: &str) -> IssueId {
        let mut inner = self.lock();
        inner.next_issue += 1;
        let id = IssueId(inner.next_issue);
        inner.issues.insert(
            id,
            IssueRecord {
                title: title.to_string(),
                ..IssueRecord::default()
            },
        );
        id
    }

    /// Seeds a user, optionally mapped to an external platform login.
    /// Fixture helper.
    pub fn add_user(&self, username: &str, external_login: Option<&str>) {
        self.lock().users.push(UserRecord {
            username: username.to_string(),
            external_login: external_login.map(str::to_string),
        });
    }

    /// Returns the committed link records attached to an issue.
    pub fn links_of(&self, issue: IssueId) -> Vec<PullRequestLink> {
        let inner = self.lock();
        inner
            .issues
            .get(&issue)
            .map(|record| {
                record
                    .links
                    .iter()
                    .filter_map(|id| inner.links.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the committed messages attached to an issue.
    pub fn messages_of(&self, issue: IssueId) -> Vec<MessageRecord> {
        let inner = self.lock();
        inner
            .issues
            .get(&issue)
            .map(|record| {
                record
                    .messages
                    .iter()
                    .filter_map(|id| inner.messages.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the committed (status, resolution, stage) names of an issue.
    pub fn enums_of(&self, issue: IssueId) -> (Option<String>, Option<String>, Option<String>) {
        let inner = self.lock();
        match inner.issues.get(&issue) {
            Some(record) => (
                record.status.as_ref().map(|v| v.0.clone()),
                record.resolution.as_ref().map(|v| v.0.clone()),
                record.stage.as_ref().map(|v| v.0.clone()),
            ),
            None => (None, None, None),
        }
    }

    /// Returns the committed title of an issue.
    pub fn title_of(&self, issue: IssueId) -> Option<String> {
        self.lock().issues.get(&issue).map(|r| r.title.clone())
    }

    /// Returns all committed issue ids.
    pub fn issue_ids(&self) -> Vec<IssueId> {
        self.lock().issues.keys().copied().collect()
    }

    /// Total number of committed link records.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    /// Total number of committed message records.
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }
}

impl TrackerStoreFactory for MemoryStore {
    fn open_session(&self) -> Box<dyn TrackerStore> {
        let working = self.lock().clone();
        Box::new(MemorySession {
            shared: Arc::clone(&self.inner),
            working,
            identity: Identity::Anonymous,
            pending: Vec::new(),
        })
    }
}

/// One pending mutation, replayed onto the shared state at commit.
///
/// List updates carry their delta against the session's view rather than
/// the resulting list, so replay merges with whatever other sessions have
/// committed in the meantime instead of clobbering it.
#[derive(Debug, Clone)]
enum PendingOp {
    InsertIssue(IssueId, IssueRecord),
    SetIssueLinks {
        issue: IssueId,
        added: Vec<LinkId>,
        removed: Vec<LinkId>,
    },
    SetIssueMessages {
        issue: IssueId,
        added: Vec<MessageId>,
        removed: Vec<MessageId>,
    },
    SetIssueEnum(IssueId, EnumDomain, EnumValue),
    InsertLink(LinkId, PullRequestLink),
    SetLink(LinkId, Option<String>, LinkStatus),
    InsertMessage(MessageId, MessageRecord),
}

/// One snapshot-isolated session against a [`MemoryStore`].
pub struct MemorySession {
    shared: Arc<Mutex<Inner>>,
    working: Inner,
    identity: Identity,
    pending: Vec<PendingOp>,
}

impl MemorySession {
    fn shared_lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn list_delta<T: Copy + Eq>(old: &[T], new: &[T]) -> (Vec<T>, Vec<T>) {
    let added = new.iter().copied().filter(|x| !old.contains(x)).collect();
    let removed = old.iter().copied().filter(|x| !new.contains(x)).collect();
    (added, removed)
}

fn merge_list<T: Copy + Eq>(list: &mut Vec<T>, added: &[T], removed: &[T]) {
    list.retain(|x| !removed.contains(x));
    for &x in added {
        if !list.contains(&x) {
            list.push(x);
        }
    }
}

fn known_values(domain: EnumDomain) -> &'static [&'static str] {
    match domain {
        EnumDomain::Status => &["open", "pending", "closed"],
        EnumDomain::Resolution => &["accepted", "duplicate", "fixed", "later", "wontfix"],
        EnumDomain::Stage => &["needs patch", "patch review", "commit review", "resolved"],
    }
}

impl TrackerStore for MemorySession {
    fn find_issues(&self, ids: &[IssueId]) -> Result<Vec<IssueId>, StoreError> {
        Ok(ids
            .iter()
            .copied()
            .filter(|id| self.working.issues.contains_key(id))
            .collect())
    }

    fn create_issue(&mut self, title: &str) -> Result<IssueId, StoreError> {
        // Ids come from the shared counter so concurrent sessions never
        // allocate the same one.
        let id = {
            let mut shared = self.shared_lock();
            shared.next_issue += 1;
            IssueId(shared.next_issue)
        };
        let record = IssueRecord {
            title: title.to_string(),
            ..IssueRecord::default()
        };
        self.working.issues.insert(id, record.clone());
        self.pending.push(PendingOp::InsertIssue(id, record));
        Ok(id)
    }

    fn issue_links(&self, issue: IssueId) -> Result<Vec<LinkId>, StoreError> {
        Ok(self.working.issue(issue)?.links.clone())
    }

    fn set_issue_links(&mut self, issue: IssueId, links: Vec<LinkId>) -> Result<(), StoreError> {
        let record = self.working.issue_mut(issue)?;
        let (added, removed) = list_delta(&record.links, &links);
        record.links = links;
        self.pending.push(PendingOp::SetIssueLinks {
            issue,
            added,
            removed,
        });
        Ok(())
    }

    fn issue_messages(&self, issue: IssueId) -> Result<Vec<MessageId>, StoreError> {
        Ok(self.working.issue(issue)?.messages.clone())
    }

    fn set_issue_messages(
        &mut self,
        issue: IssueId,
        messages: Vec<MessageId>,
    ) -> Result<(), StoreError> {
        let record = self.working.issue_mut(issue)?;
        let (added, removed) = list_delta(&record.messages, &messages);
        record.messages = messages;
        self.pending.push(PendingOp::SetIssueMessages {
            issue,
            added,
            removed,
        });
        Ok(())
    }

    fn set_issue_enum(
        &mut self,
        issue: IssueId,
        domain: EnumDomain,
        value: EnumValue,
    ) -> Result<(), StoreError> {
        let record = self.working.issue_mut(issue)?;
        match domain {
            EnumDomain::Status => record.status = Some(value.clone()),
            EnumDomain::Resolution => record.resolution = Some(value.clone()),
            EnumDomain::Stage => record.stage = Some(value.clone()),
        }
        self.pending
            .push(PendingOp::SetIssueEnum(issue, domain, value));
        Ok(())
    }

    fn find_links_by_number(&self, number: &str) -> Result<Vec<LinkId>, StoreError> {
        Ok(self
            .working
            .links
            .iter()
            .filter(|(_, link)| link.number == number)
            .map(|(id, _)| *id)
            .collect())
    }

    fn create_link(
        &mut self,
        number: &str,
        title: Option<&str>,
        status: LinkStatus,
    ) -> Result<LinkId, StoreError> {
        let id = {
            let mut shared = self.shared_lock();
            shared.next_link += 1;
            LinkId(shared.next_link)
        };
        let record = PullRequestLink {
            number: number.to_string(),
            title: title.map(str::to_string),
            status,
        };
        self.working.links.insert(id, record.clone());
        self.pending.push(PendingOp::InsertLink(id, record));
        Ok(id)
    }

    fn get_link(&self, link: LinkId) -> Result<PullRequestLink, StoreError> {
        self.working
            .links
            .get(&link)
            .cloned()
            .ok_or(StoreError::NoSuchLink(link))
    }

    fn set_link(
        &mut self,
        link: LinkId,
        title: Option<&str>,
        status: LinkStatus,
    ) -> Result<(), StoreError> {
        let record = self
            .working
            .links
            .get_mut(&link)
            .ok_or(StoreError::NoSuchLink(link))?;
        record.title = title.map(str::to_string);
        record.status = status;
        self.pending
            .push(PendingOp::SetLink(link, title.map(str::to_string), status));
        Ok(())
    }

    fn create_message(
        &mut self,
        content: &str,
        author: &Identity,
        timestamp: DateTime<Utc>,
    ) -> Result<MessageId, StoreError> {
        let id = {
            let mut shared = self.shared_lock();
            shared.next_message += 1;
            MessageId(shared.next_message)
        };
        let record = MessageRecord {
            content: content.to_string(),
            author: author.clone(),
            timestamp,
        };
        self.working.messages.insert(id, record.clone());
        self.pending.push(PendingOp::InsertMessage(id, record));
        Ok(id)
    }

    fn lookup_enum(&self, domain: EnumDomain, name: &str) -> Result<EnumValue, StoreError> {
        if known_values(domain).contains(&name) {
            Ok(EnumValue(name.to_string()))
        } else {
            Err(StoreError::UnknownEnumValue {
                domain,
                name: name.to_string(),
            })
        }
    }

    fn resolve_user_by_external_login(
        &self,
        login: &str,
    ) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.external_login.as_deref() == Some(login))
            .map(|u| Identity::User(u.username.clone())))
    }

    fn resolve_user_by_name(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| Identity::User(u.username.clone())))
    }

    fn set_current_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    fn current_identity(&self) -> &Identity {
        &self.identity
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // Replayed in mutation order onto the live state, so records
        // committed by other sessions in the meantime are preserved.
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        for op in self.pending.drain(..) {
            match op {
                PendingOp::InsertIssue(id, record) => {
                    shared.issues.insert(id, record);
                }
                PendingOp::SetIssueLinks {
                    issue,
                    added,
                    removed,
                } => {
                    if let Some(record) = shared.issues.get_mut(&issue) {
                        merge_list(&mut record.links, &added, &removed);
                    }
                }
                PendingOp::SetIssueMessages {
                    issue,
                    added,
                    removed,
                } => {
                    if let Some(record) = shared.issues.get_mut(&issue) {
                        merge_list(&mut record.messages, &added, &removed);
                    }
                }
                PendingOp::SetIssueEnum(issue, domain, value) => {
                    if let Some(record) = shared.issues.get_mut(&issue) {
                        match domain {
                            EnumDomain::Status => record.status = Some(value),
                            EnumDomain::Resolution => record.resolution = Some(value),
                            EnumDomain::Stage => record.stage = Some(value),
                        }
                    }
                }
                PendingOp::InsertLink(id, record) => {
                    shared.links.insert(id, record);
                }
                PendingOp::SetLink(id, title, status) => {
                    if let Some(record) = shared.links.get_mut(&id) {
                        record.title = title;
                        record.status = status;
                    }
                }
                PendingOp::InsertMessage(id, record) => {
                    shared.messages.insert(id, record);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncommitted_mutations_are_not_durable() {
        let store = MemoryStore::new();
        let issue = store.add_issue("seed");

        {
            let mut session = store.open_session();
            let link = session
                .create_link("42", Some("title"), LinkStatus::Open)
                .unwrap();
            session.set_issue_links(issue, vec![link]).unwrap();
            // dropped without commit
        }

        assert_eq!(store.link_count(), 0);
        assert!(store.links_of(issue).is_empty());
    }

    #[test]
    fn commit_makes_mutations_visible() {
        let store = MemoryStore::new();
        let issue = store.add_issue("seed");

        let mut session = store.open_session();
        let link = session
            .create_link("42", Some("title"), LinkStatus::Open)
            .unwrap();
        session.set_issue_links(issue, vec![link]).unwrap();
        session.commit().unwrap();

        let links = store.links_of(issue);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].number, "42");
        assert_eq!(links[0].status, LinkStatus::Open);
    }

    #[test]
    fn overlapping_sessions_both_commit_durably() {
        let store = MemoryStore::new();
        let a = store.add_issue("a");
        let b = store.add_issue("b");

        // Both sessions open before either commits, as with two deliveries
        // in flight at once.
        let mut first = store.open_session();
        let mut second = store.open_session();

        let link_a = first.create_link("1", None, LinkStatus::Open).unwrap();
        first.set_issue_links(a, vec![link_a]).unwrap();
        let link_b = second.create_link("2", None, LinkStatus::Open).unwrap();
        second.set_issue_links(b, vec![link_b]).unwrap();

        first.commit().unwrap();
        second.commit().unwrap();

        assert_eq!(store.links_of(a).len(), 1);
        assert_eq!(store.links_of(b).len(), 1);
        assert_eq!(store.link_count(), 2);
    }

    #[test]
    fn overlapping_appends_to_one_issue_merge() {
        let store = MemoryStore::new();
        let issue = store.add_issue("shared");

        let mut first = store.open_session();
        let mut second = store.open_session();

        let link1 = first.create_link("1", None, LinkStatus::Open).unwrap();
        first.set_issue_links(issue, vec![link1]).unwrap();
        let link2 = second.create_link("2", None, LinkStatus::Open).unwrap();
        second.set_issue_links(issue, vec![link2]).unwrap();

        first.commit().unwrap();
        second.commit().unwrap();

        let numbers: Vec<String> = store
            .links_of(issue)
            .into_iter()
            .map(|l| l.number)
            .collect();
        assert_eq!(numbers, vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn overlapping_messages_and_closes_both_survive() {
        let store = MemoryStore::new();
        let a = store.add_issue("a");
        let b = store.add_issue("b");

        let mut first = store.open_session();
        let mut second = store.open_session();

        let msg_a = first
            .create_message("on a", &Identity::Anonymous, Utc::now())
            .unwrap();
        first.set_issue_messages(a, vec![msg_a]).unwrap();
        first
            .set_issue_enum(a, EnumDomain::Status, EnumValue("closed".into()))
            .unwrap();
        let msg_b = second
            .create_message("on b", &Identity::Anonymous, Utc::now())
            .unwrap();
        second.set_issue_messages(b, vec![msg_b]).unwrap();

        first.commit().unwrap();
        second.commit().unwrap();

        assert_eq!(store.messages_of(a).len(), 1);
        assert_eq!(store.messages_of(b).len(), 1);
        assert_eq!(store.enums_of(a).0.as_deref(), Some("closed"));
    }

    #[test]
    fn session_reads_its_own_writes() {
        let store = MemoryStore::new();
        let issue = store.add_issue("seed");

        let mut session = store.open_session();
        let link = session.create_link("7", None, LinkStatus::Unset).unwrap();
        session.set_issue_links(issue, vec![link]).unwrap();

        // Visible within the session before commit
        assert_eq!(session.issue_links(issue).unwrap(), vec![link]);
        assert_eq!(session.find_links_by_number("7").unwrap(), vec![link]);
    }

    #[test]
    fn find_issues_filters_missing_ids() {
        let store = MemoryStore::new();
        let a = store.add_issue("a");
        let b = store.add_issue("b");

        let session = store.open_session();
        let found = session
            .find_issues(&[a, IssueId(999), b])
            .unwrap();
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn lookup_enum_known_and_unknown() {
        let store = MemoryStore::new();
        let session = store.open_session();

        assert_eq!(
            session.lookup_enum(EnumDomain::Status, "closed").unwrap(),
            EnumValue("closed".into())
        );
        assert_eq!(
            session.lookup_enum(EnumDomain::Resolution, "fixed").unwrap(),
            EnumValue("fixed".into())
        );
        assert_eq!(
            session.lookup_enum(EnumDomain::Stage, "resolved").unwrap(),
            EnumValue("resolved".into())
        );
        assert!(session
            .lookup_enum(EnumDomain::Status, "no-such-status")
            .is_err());
    }

    #[test]
    fn user_resolution() {
        let store = MemoryStore::new();
        store.add_user("alice", Some("alice-gh"));
        store.add_user("tracker-bot", None);

        let session = store.open_session();
        assert_eq!(
            session.resolve_user_by_external_login("alice-gh").unwrap(),
            Some(Identity::User("alice".into()))
        );
        assert_eq!(
            session.resolve_user_by_external_login("nobody").unwrap(),
            None
        );
        assert_eq!(
            session.resolve_user_by_name("tracker-bot").unwrap(),
            Some(Identity::User("tracker-bot".into()))
        );
    }

    #[test]
    fn identity_is_session_scoped() {
        let store = MemoryStore::new();

        let mut a = store.open_session();
        let b = store.open_session();
        a.set_current_identity(Identity::User("alice".into()));

        assert_eq!(a.current_identity(), &Identity::User("alice".into()));
        assert_eq!(b.current_identity(), &Identity::Anonymous);
    }

    #[test]
    fn missing_issue_errors() {
        let store = MemoryStore::new();
        let mut session = store.open_session();

        assert_eq!(
            session.issue_links(IssueId(1)).unwrap_err(),
            StoreError::NoSuchIssue(IssueId(1))
        );
        assert_eq!(
            session
                .set_issue_enum(IssueId(1), EnumDomain::Status, EnumValue("closed".into()))
                .unwrap_err(),
            StoreError::NoSuchIssue(IssueId(1))
        );
    }
}
