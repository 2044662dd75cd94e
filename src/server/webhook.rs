//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries on `POST /` and walks them through a
//! fixed sequence, each step a hard exit on failure: required headers, full
//! body buffering, signature verification, JSON parse, classification, and
//! finally registry update + job dispatch. The 202 for an accepted tag is
//! decided before the packaging outcome is known.
//!
//! Body buffering is the only suspend point and carries no timeout: a
//! stalled client holds its handler task until the connection drops.

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::types::DeliveryId;
use crate::webhooks::{
    classify, compute_signature, format_signature_header, verify_signature, Classification,
    ClassifyError,
};

/// Header name for GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
pub const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature";

/// Webhook payloads are small; anything past this is not a GitHub event.
const BODY_LIMIT: usize = 1024 * 1024;

/// Errors that can occur when processing a webhook.
///
/// The `IntoResponse` impl is the single place that maps each error to its
/// status code and emits the branch-specific error log.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The request body stream failed before the full body arrived.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    /// Signature did not match. Carries both header values so the operator
    /// can diagnose the mismatch; the secret itself is never logged.
    #[error("signature mismatch")]
    SignatureMismatch { provided: String, computed: String },

    /// Invalid JSON body.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload missing a field the body contract requires.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(header) => {
                error!(header = %header, "webhook rejected: missing required header");
                StatusCode::BAD_REQUEST
            }
            WebhookError::BodyRead(cause) => {
                error!(error = %cause, "webhook failed: could not buffer request body");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::SignatureMismatch { provided, computed } => {
                error!(
                    provided = %provided,
                    computed = %computed,
                    "webhook rejected: signature mismatch"
                );
                StatusCode::UNAUTHORIZED
            }
            WebhookError::InvalidJson(cause) => {
                error!(error = %cause, "webhook rejected: body is not valid JSON");
                StatusCode::BAD_REQUEST
            }
            WebhookError::Classify(ClassifyError::MissingField(field)) => {
                error!(field = %field, "webhook rejected: payload missing required field");
                StatusCode::BAD_REQUEST
            }
        };

        status.into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `x-github-delivery`: Unique delivery ID
///   - `x-hub-signature`: HMAC-SHA1 signature of the payload (`sha1=<hex>`)
///   - `x-github-event`: Event type (e.g., "create", "ping")
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: Ping acknowledged
/// - 202 Accepted: Tag on a known project; packaging job dispatched
/// - 204 No Content: Recognized but not actionable
/// - 400 Bad Request: Missing header, invalid JSON, or missing payload field
/// - 401 Unauthorized: Invalid signature
/// - 500 Internal Server Error: Body stream failure
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, WebhookError> {
    // Header presence is checked before the body is even read; each missing
    // header is its own exit.
    let delivery_id = DeliveryId::new(require_header(&headers, HEADER_DELIVERY)?);
    let signature = require_header(&headers, HEADER_SIGNATURE)?;
    let event = require_header(&headers, HEADER_EVENT)?;

    debug!(delivery_id = %delivery_id, event = %event, "received webhook delivery");

    // The whole body must be on hand before any of it is trusted; partial
    // bodies are never parsed.
    let body = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(WebhookError::BodyRead)?;

    if !verify_signature(&body, &signature, state.webhook_secret()) {
        let computed = format_signature_header(&compute_signature(&body, state.webhook_secret()));
        return Err(WebhookError::SignatureMismatch {
            provided: signature,
            computed,
        });
    }

    let payload: Value = serde_json::from_slice(&body)?;

    match classify(&event, &payload, state.registry())? {
        Classification::Ping { zen } => {
            info!(
                delivery_id = %delivery_id,
                zen = %zen.as_deref().unwrap_or_default(),
                "ping received"
            );
            Ok(StatusCode::OK.into_response())
        }
        Classification::EventMismatch { event } => {
            info!(delivery_id = %delivery_id, event = %event, "ignoring event: not a create event");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Classification::RefMismatch { ref_type } => {
            info!(
                delivery_id = %delivery_id,
                ref_type = %ref_type.as_deref().unwrap_or("<absent>"),
                "ignoring create event: ref is not a tag"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Classification::UnknownProject { name } => {
            info!(
                delivery_id = %delivery_id,
                repo = %name,
                "ignoring tag event: project not in registry"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Classification::Accept { name, tag } => {
            // Registry entries are never removed, so the update cannot miss;
            // the guard keeps a surprise from panicking a handler.
            match state.registry().update_tag(&name, &tag) {
                Some(project) => {
                    let job = state.dispatcher().dispatch(project);
                    info!(
                        delivery_id = %delivery_id,
                        repo = %name,
                        tag = %tag,
                        job = %job,
                        "tag event accepted; packaging job dispatched"
                    );
                }
                None => {
                    warn!(delivery_id = %delivery_id, repo = %name, "project vanished before tag update");
                }
            }
            Ok(StatusCode::ACCEPTED.into_response())
        }
    }
}

/// Extracts a required header value as a string.
fn require_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
