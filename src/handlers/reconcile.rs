//! Link reconciliation: create-or-link and update-or-create.
//!
//! Both operations are idempotent under redelivery: before creating a link
//! on an issue, the issue's existing links are scanned for one with the same
//! external number, and a duplicate create is skipped. Every target issue id
//! must resolve to an existing issue or the whole operation is silently
//! dropped without any mutation.

use tracing::debug;

use crate::store::TrackerStore;
use crate::types::{IssueId, LinkStatus, PrNumber};

use super::HandlerError;

/// Creates a link between the pull request and each target issue, skipping
/// issues already linked to the same external number.
pub fn create_or_link(
    store: &mut dyn TrackerStore,
    number: PrNumber,
    title: Option<&str>,
    status: LinkStatus,
    issue_ids: &[IssueId],
) -> Result<(), HandlerError> {
    if issue_ids.is_empty() {
        return Ok(());
    }
    if !all_issues_exist(store, issue_ids)? {
        debug!(pr = %number, "skipping link creation: unresolved issue reference");
        return Ok(());
    }

    let number_str = number.as_link_number();
    let mut mutated = false;
    for &issue_id in issue_ids {
        let mut links = store.issue_links(issue_id)?;
        if find_link_by_number(store, &links, &number_str)?.is_some() {
            debug!(pr = %number, issue = %issue_id, "already linked");
            continue;
        }
        let link = store.create_link(&number_str, title, status)?;
        links.push(link);
        store.set_issue_links(issue_id, links)?;
        debug!(pr = %number, issue = %issue_id, "linked pull request");
        mutated = true;
    }
    if mutated {
        store.commit()?;
    }
    Ok(())
}

/// Updates title/status of the existing link on each target issue; issues
/// not yet linked fall back to the create path.
///
/// Updates only fire when the event carried a title; an update without one
/// is a no-op.
pub fn update_or_create(
    store: &mut dyn TrackerStore,
    number: PrNumber,
    title: Option<&str>,
    status: LinkStatus,
    issue_ids: &[IssueId],
) -> Result<(), HandlerError> {
    let Some(title) = title else {
        return Ok(());
    };
    if issue_ids.is_empty() {
        return Ok(());
    }
    if !all_issues_exist(store, issue_ids)? {
        debug!(pr = %number, "skipping link update: unresolved issue reference");
        return Ok(());
    }

    let number_str = number.as_link_number();
    let mut mutated = false;
    for &issue_id in issue_ids {
        let links = store.issue_links(issue_id)?;
        match find_link_by_number(store, &links, &number_str)? {
            Some(link) => {
                store.set_link(link, Some(title), status)?;
                debug!(pr = %number, issue = %issue_id, "updated link");
                mutated = true;
            }
            None => {
                create_or_link(store, number, Some(title), status, &[issue_id])?;
            }
        }
    }
    if mutated {
        store.commit()?;
    }
    Ok(())
}

/// True iff every id resolves to an existing issue.
fn all_issues_exist(
    store: &dyn TrackerStore,
    issue_ids: &[IssueId],
) -> Result<bool, HandlerError> {
    let found = store.find_issues(issue_ids)?;
    Ok(found.len() == issue_ids.len())
}

/// Scans an issue's links for one with the given external number.
fn find_link_by_number(
    store: &dyn TrackerStore,
    links: &[crate::types::LinkId],
    number: &str,
) -> Result<Option<crate::types::LinkId>, HandlerError> {
    for &link in links {
        if store.get_link(link)?.number == number {
            return Ok(Some(link));
        }
    }
    Ok(None)
}
