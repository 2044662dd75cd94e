//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA1)
//! - Classification of parsed payloads into relay decisions

pub mod classify;
pub mod signature;

pub use classify::{classify, Classification, ClassifyError};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
