//! Manual force-trigger endpoint.
//!
//! `GET /force/{repo}/{*tag}` lets an operator set a project's tag and
//! dispatch a packaging job without a webhook. The route carries no signature
//! check: it is an operator-trusted manual override, and that asymmetry with
//! the webhook route is intentional.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;

use super::AppState;

/// Force-trigger handler.
///
/// `repo` is constrained to `[\w.-]+`; a name outside that pattern cannot
/// name a registered project and takes the unknown-project exit. `tag` is
/// the non-empty path remainder, so tags containing `/` work.
///
/// # Response
///
/// - 200 OK: Job dispatched; body confirms repo and tag
/// - 400 Bad Request: Unknown repo; body carries the name
pub async fn force_handler(
    State(state): State<AppState>,
    Path((repo, tag)): Path<(String, String)>,
) -> Response {
    let project = if is_valid_repo_name(&repo) {
        state.registry().update_tag(&repo, &tag)
    } else {
        None
    };

    let Some(project) = project else {
        info!(repo = %repo, "force trigger rejected: unknown project");
        return (StatusCode::BAD_REQUEST, unknown_project_message(&repo)).into_response();
    };

    let job = state.dispatcher().dispatch(project);
    info!(repo = %repo, tag = %tag, job = %job, "forced packaging run");

    (StatusCode::OK, forced_message(&repo, &tag)).into_response()
}

/// Repo names match `[\w.-]+`.
fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn unknown_project_message(repo: &str) -> String {
    format!("{repo} is not a registered project")
}

fn forced_message(repo: &str, tag: &str) -> String {
    format!("Forcing a packaging run for {repo} with tag {tag}")
}
