//! Startup loader for the project manifest.
//!
//! The manifest lives in a GitHub gist: the gist document's `files` mapping
//! must contain `addons.json`, whose `content` string is a JSON array of
//! project descriptor objects.
//!
//! Loading runs once at startup, outside any request path. Every failure mode
//! gets its own [`LoadError`] variant so the startup log says exactly what
//! went wrong; the caller logs the error and continues with an empty
//! registry rather than crashing.

use reqwest::header;
use serde_json::Value;
use thiserror::Error;

use super::ProjectDescriptor;

/// Base URL of the GitHub REST API.
const GITHUB_API: &str = "https://api.github.com";

/// Name of the manifest file inside the gist.
pub const MANIFEST_FILE: &str = "addons.json";

/// The GitHub API rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("tag-relay/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while loading the project manifest.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Network or HTTP-level failure fetching the gist document.
    #[error("manifest request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gist document has no `files` mapping.
    #[error("remote document has no files section")]
    MissingFiles,

    /// The `files` mapping does not contain the manifest file.
    #[error("manifest file {0:?} not present in remote document")]
    ManifestNotFound(&'static str),

    /// The manifest file's content is not a JSON array of project
    /// descriptors.
    #[error("manifest content is not valid JSON: {0}")]
    Manifest(#[source] serde_json::Error),
}

/// Fetches and parses the project manifest from the given gist.
pub async fn fetch_manifest(
    client: &reqwest::Client,
    gist_id: &str,
) -> Result<Vec<ProjectDescriptor>, LoadError> {
    let url = format!("{GITHUB_API}/gists/{gist_id}");
    let document: Value = client
        .get(&url)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    parse_document(&document)
}

/// Extracts the project list from a fetched gist document.
pub fn parse_document(document: &Value) -> Result<Vec<ProjectDescriptor>, LoadError> {
    let files = document
        .get("files")
        .and_then(Value::as_object)
        .ok_or(LoadError::MissingFiles)?;

    let content = files
        .get(MANIFEST_FILE)
        .and_then(|file| file.get("content"))
        .and_then(Value::as_str)
        .ok_or(LoadError::ManifestNotFound(MANIFEST_FILE))?;

    serde_json::from_str(content).map_err(LoadError::Manifest)
}
