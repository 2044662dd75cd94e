//! Environment-provided configuration.
//!
//! All settings arrive as environment variables: `SECRET_KEY` (the shared
//! webhook secret) and `GIST_ID` (the remote manifest document) are required,
//! `PORT` defaults to 5000. The values are opaque strings to the relay.

use std::env;

use thiserror::Error;

/// Port the relay listens on when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5000;

/// Errors raised while reading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

/// Startup configuration for the relay.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret for webhook signature verification.
    pub secret: String,

    /// Gist id of the remote project manifest.
    pub gist_id: String,

    /// Listening port.
    pub port: u16,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = require_var("SECRET_KEY")?;
        let gist_id = require_var("GIST_ID")?;

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidVar { var: "PORT", value })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Config {
            secret,
            gist_id,
            port,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
