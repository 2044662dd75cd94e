//! Core domain types shared across modules.

pub mod ids;

pub use ids::{DeliveryId, JobId};
