//! A bridge that ingests repository webhooks and reconciles them against an
//! issue tracker.
//!
//! Deliveries are authenticated (HMAC-SHA1 over the raw body), parsed into
//! typed events, and dispatched to handlers that link pull requests to the
//! tracker issues their titles, bodies, and commit messages reference. Push
//! events additionally post changeset comments and can close the referenced
//! issues.
//!
//! # Architecture
//!
//! - [`webhooks`] - signature verification, request authentication, and
//!   payload parsing into typed events
//! - [`extract`] - issue-reference extraction from free text
//! - [`aggregate`] - per-issue batching of push commits
//! - [`handlers`] - event handlers and link reconciliation
//! - [`store`] - the tracker store abstraction and an in-memory backend
//! - [`server`] - the axum HTTP surface
//! - [`config`] - environment-driven configuration

pub mod aggregate;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod server;
pub mod store;
pub mod types;
pub mod webhooks;
