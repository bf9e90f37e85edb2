//! Webhook handling for inbound deliveries.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA1)
//! - Transport-level request authentication
//! - Payload parsing into typed events

pub mod auth;
pub mod events;
pub mod parser;
pub mod signature;

pub use auth::{authenticate, AuthError, RawDelivery};
pub use events::{
    BridgeEvent, CommentAction, IssueCommentEvent, PrAction, PullRequestEvent, PushEvent,
    PushedCommit,
};
pub use parser::{parse_webhook, ParseError};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
