//! Webhook endpoint handler.
//!
//! Accepts webhook deliveries, authenticates them (method, content type,
//! event header, HMAC-SHA1 signature), parses the payload, and drives the
//! reconciliation handlers against a fresh store session. Processing is
//! strictly sequential within one delivery; nothing is persisted unless the
//! session commits.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::handlers::handle_event;
use crate::webhooks::{authenticate, parse_webhook, AuthError, RawDelivery};

/// Header carrying the event-type name.
const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the payload signature (`sha1=<hex>`).
const HEADER_SIGNATURE: &str = "x-hub-signature";

/// Errors surfaced by the webhook endpoint.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Transport-level authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The payload was malformed or handling failed.
    #[error("rejected: {0}")]
    Reject(String),
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match &self {
            BridgeError::Auth(AuthError::MethodNotAllowed) => StatusCode::METHOD_NOT_ALLOWED,
            BridgeError::Auth(AuthError::UnsupportedMediaType) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            BridgeError::Auth(AuthError::Unauthorised) => StatusCode::UNAUTHORIZED,
            BridgeError::Auth(AuthError::Reject(_)) | BridgeError::Reject(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Content-Type: `application/json`
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "push")
///   - `X-Hub-Signature`: HMAC-SHA1 signature of the payload (`sha1=<hex>`)
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: Delivery processed (including deliveries acknowledged with no
///   action, such as unknown event types)
/// - 400 Bad Request: Missing event header, malformed payload, missing
///   secret configuration, or handler failure
/// - 401 Unauthorized: Signature mismatch
/// - 405 Method Not Allowed: Non-POST request
/// - 415 Unsupported Media Type: Wrong content type
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), BridgeError> {
    let raw = RawDelivery {
        method: method.as_str(),
        content_type: get_header(&headers, header::CONTENT_TYPE.as_str()),
        event_type: get_header(&headers, HEADER_EVENT),
        signature: get_header(&headers, HEADER_SIGNATURE),
        body: &body,
    };

    let event_type = authenticate(&raw, app_state.config().secret())?;
    debug!(event_type, "delivery authenticated");

    let event = match parse_webhook(event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            // Acknowledged, no tracker mutation
            debug!(event_type, "no handler for delivery; acknowledged");
            return Ok((StatusCode::OK, "OK"));
        }
        Err(e) => {
            warn!(event_type, error = %e, "malformed payload");
            return Err(BridgeError::Reject(e.to_string()));
        }
    };

    let mut session = app_state.store().open_session();
    match handle_event(&event, session.as_mut(), app_state.config()) {
        Ok(()) => {
            info!(event_type, "delivery reconciled");
            Ok((StatusCode::OK, "OK"))
        }
        Err(e) => {
            // Any handler failure is terminal for this delivery; the sender
            // may redeliver safely.
            error!(event_type, error = %e, "event handling failed");
            Err(BridgeError::Reject(e.to_string()))
        }
    }
}

/// Extracts an optional header value as a string.
fn get_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
