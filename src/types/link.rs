//! Pull-request link status.

use serde::{Deserialize, Serialize};

/// Status recorded on a pull-request link.
///
/// The external platform reports only open/closed; a separate merge flag
/// promotes closed-and-merged to `Merged`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Status was absent from the payload.
    #[default]
    Unset,
    /// PR is open.
    Open,
    /// PR is closed without merge.
    Closed,
    /// PR was merged.
    Merged,
}

impl LinkStatus {
    /// Computes the status from the payload's raw state and merge flag.
    ///
    /// The merge flag overrides the raw open/closed state.
    pub fn from_state(state: Option<&str>, merged: bool) -> Self {
        if merged {
            return LinkStatus::Merged;
        }
        match state {
            Some("open") => LinkStatus::Open,
            Some("closed") => LinkStatus::Closed,
            _ => LinkStatus::Unset,
        }
    }
}
