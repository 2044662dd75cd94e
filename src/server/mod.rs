//! HTTP gateway for the relay.
//!
//! This module implements the HTTP surface that:
//! - Accepts GitHub `create` webhooks, authenticates them, and dispatches
//!   packaging jobs for tags on known projects
//! - Provides an operator-facing force route that triggers a packaging job
//!   without a webhook
//! - Redirects the index to the setup documentation
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `POST /` - Webhook receiver (400/401/500 on bad input, 200 for ping,
//!   204 for recognized-but-not-actionable, 202 when a job is dispatched)
//! - `GET /force/{repo}/{*tag}` - Manual trigger (400 unknown repo, 200 otherwise)
//! - `GET /` - Redirect to documentation
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;
use crate::registry::Registry;

pub mod force;
pub mod health;
pub mod webhook;

pub use force::force_handler;
pub use health::health_handler;
pub use webhook::webhook_handler;

/// Where the index redirects operators for setup instructions.
const DOCS_URL: &str = "https://github.com/tag-relay/tag-relay/wiki/Setup";

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Known projects, loaded at startup and tag-updated on triggers.
    registry: Registry,

    /// Allocates job ids and hands jobs to the packaging pipeline.
    dispatcher: Dispatcher,

    /// Shared secret for HMAC-SHA1 webhook signature verification.
    webhook_secret: Vec<u8>,
}

impl AppState {
    pub fn new(
        registry: Registry,
        dispatcher: Dispatcher,
        webhook_secret: impl Into<Vec<u8>>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                registry,
                dispatcher,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

async fn index_handler() -> Redirect {
    Redirect::temporary(DOCS_URL)
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler).post(webhook_handler))
        .route("/force/{repo}/{*tag}", get(force_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
