//! Transport-level validation of inbound webhook deliveries.
//!
//! Every delivery passes through [`authenticate`] before its payload is
//! looked at. The checks run in a fixed order:
//!
//! 1. HTTP method must be `POST`
//! 2. Content type must be exactly `application/json`
//! 3. The event-type header must be present
//! 4. The configured secret must exist and the HMAC-SHA1 signature must match
//!
//! A missing secret is a server misconfiguration: it is logged and the
//! delivery is rejected. Deliveries are never accepted unsigned.

use thiserror::Error;
use tracing::{error, warn};

use super::signature::verify_signature;

/// Rejection reasons for an inbound delivery.
///
/// All variants are terminal for the current delivery; the sender is
/// responsible for redelivery, which is safe because reconciliation is
/// idempotent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The HTTP method was not POST.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The content type was not `application/json`.
    #[error("unsupported media type")]
    UnsupportedMediaType,

    /// The signature did not match the payload.
    #[error("unauthorised")]
    Unauthorised,

    /// Missing event-type header, missing secret configuration, or any other
    /// precondition failure.
    #[error("rejected: {0}")]
    Reject(String),
}

/// The transport-level shape of one inbound delivery.
///
/// Borrowed from the HTTP request for the duration of one
/// authenticate-and-dispatch call.
#[derive(Debug)]
pub struct RawDelivery<'a> {
    /// The HTTP method, uppercase (e.g., "POST").
    pub method: &'a str,
    /// The declared content type, if any.
    pub content_type: Option<&'a str>,
    /// The event-type header value, if present.
    pub event_type: Option<&'a str>,
    /// The `X-Hub-Signature` header value, if present.
    pub signature: Option<&'a str>,
    /// The exact raw body bytes.
    pub body: &'a [u8],
}

/// Validates transport shape and signature of a delivery.
///
/// On success returns the event-type string; the caller proceeds to payload
/// decoding. Performs no side effects beyond logging rejection reasons, and
/// never logs the secret or the supplied signature value.
pub fn authenticate<'a>(
    delivery: &RawDelivery<'a>,
    secret: Option<&[u8]>,
) -> Result<&'a str, AuthError> {
    if delivery.method != "POST" {
        warn!(method = %delivery.method, "delivery rejected: wrong method");
        return Err(AuthError::MethodNotAllowed);
    }

    if delivery.content_type != Some("application/json") {
        warn!(
            content_type = delivery.content_type.unwrap_or("<none>"),
            "delivery rejected: unsupported content type"
        );
        return Err(AuthError::UnsupportedMediaType);
    }

    let event_type = delivery.event_type.ok_or_else(|| {
        warn!("delivery rejected: missing event-type header");
        AuthError::Reject("missing event-type header".into())
    })?;

    let secret = secret.ok_or_else(|| {
        // Misconfiguration, not a client error. Reject rather than accept
        // unsigned deliveries.
        error!("webhook secret is not configured; rejecting delivery");
        AuthError::Reject("webhook secret not configured".into())
    })?;

    // A missing signature header is treated as an empty signature and fails
    // verification like any other mismatch.
    let signature = delivery.signature.unwrap_or("");
    if !verify_signature(delivery.body, signature, secret) {
        warn!(event_type, "delivery rejected: signature mismatch");
        return Err(AuthError::Unauthorised);
    }

    Ok(event_type)
}
