//! Core domain types for the tracker bridge.
//!
//! This module contains the fundamental types used throughout the
//! application, designed to prevent accidental mixing of identifier kinds.

pub mod ids;
pub mod link;

// Re-export commonly used types at the module level
pub use ids::{Identity, IssueId, LinkId, MessageId, PrNumber};
pub use link::LinkStatus;
