//! Classification of authenticated webhook payloads.
//!
//! [`classify`] decides what an inbound delivery means for the relay. It runs
//! only after the signature has been verified and the body parsed, and its
//! checks are ordered: ping, then event kind, then ref kind, then registry
//! membership. The first failing check wins; later checks are not evaluated.
//! Each outcome maps to a distinct status code and log line in the gateway.

use serde_json::Value;
use thiserror::Error;

use crate::registry::Registry;

/// Event type for GitHub's connectivity check.
pub const EVENT_PING: &str = "ping";
/// Event type delivered when a ref (branch or tag) is created.
pub const EVENT_CREATE: &str = "create";
/// The only `ref_type` the relay acts on.
pub const REF_TYPE_TAG: &str = "tag";

/// Errors raised when an otherwise-relevant payload is missing required
/// fields. These are input-shape errors and map to 400 in the gateway.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// A `create` event for a tag did not carry a required field.
    #[error("payload missing required field: {0}")]
    MissingField(&'static str),
}

/// The relay's decision about one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Connectivity check; respond 200.
    Ping { zen: Option<String> },

    /// Not a `create` event; respond 204.
    EventMismatch { event: String },

    /// A `create` event for something other than a tag; respond 204.
    RefMismatch { ref_type: Option<String> },

    /// A tag for a project the registry does not know; respond 204.
    UnknownProject { name: String },

    /// A tag on a known project; update the registry and dispatch a job.
    Accept { name: String, tag: String },
}

/// Classifies a parsed webhook payload.
///
/// `event` is the value of the `x-github-event` header; `payload` is the
/// parsed JSON body. The registry is consulted read-only, and only after the
/// event and ref checks have passed.
pub fn classify(
    event: &str,
    payload: &Value,
    registry: &Registry,
) -> Result<Classification, ClassifyError> {
    if event == EVENT_PING {
        return Ok(Classification::Ping {
            zen: string_field(payload, "zen"),
        });
    }

    if event != EVENT_CREATE {
        return Ok(Classification::EventMismatch {
            event: event.to_owned(),
        });
    }

    let ref_type = string_field(payload, "ref_type");
    if ref_type.as_deref() != Some(REF_TYPE_TAG) {
        return Ok(Classification::RefMismatch { ref_type });
    }

    let name = payload
        .get("repository")
        .and_then(|repo| repo.get("name"))
        .and_then(Value::as_str)
        .ok_or(ClassifyError::MissingField("repository.name"))?;

    if !registry.contains(name) {
        return Ok(Classification::UnknownProject {
            name: name.to_owned(),
        });
    }

    let tag = payload
        .get("ref")
        .and_then(Value::as_str)
        .ok_or(ClassifyError::MissingField("ref"))?;

    Ok(Classification::Accept {
        name: name.to_owned(),
        tag: tag.to_owned(),
    })
}

fn string_field(payload: &Value, field: &str) -> Option<String> {
    payload.get(field).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{project, registry_with};
    use proptest::prelude::*;
    use serde_json::json;

    fn tag_payload(name: &str, tag: &str) -> Value {
        json!({
            "ref_type": "tag",
            "ref": tag,
            "repository": { "name": name }
        })
    }

    #[test]
    fn ping_is_always_ping() {
        let registry = registry_with(vec![project("MyAddon")]);
        // Even a body that would otherwise classify as a tag event
        let payload = tag_payload("MyAddon", "v1.0.0");

        let result = classify("ping", &payload, &registry).unwrap();
        assert!(matches!(result, Classification::Ping { zen: None }));
    }

    #[test]
    fn ping_carries_zen() {
        let registry = Registry::new();
        let payload = json!({ "zen": "Keep it logically awesome." });

        let result = classify("ping", &payload, &registry).unwrap();
        assert_eq!(
            result,
            Classification::Ping {
                zen: Some("Keep it logically awesome.".to_owned())
            }
        );
    }

    #[test]
    fn non_create_event_is_event_mismatch() {
        let registry = registry_with(vec![project("MyAddon")]);
        // Event check wins before the ref is even inspected
        let payload = tag_payload("MyAddon", "v1.0.0");

        let result = classify("push", &payload, &registry).unwrap();
        assert_eq!(
            result,
            Classification::EventMismatch {
                event: "push".to_owned()
            }
        );
    }

    #[test]
    fn branch_ref_is_ref_mismatch() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = json!({
            "ref_type": "branch",
            "ref": "main",
            "repository": { "name": "MyAddon" }
        });

        let result = classify("create", &payload, &registry).unwrap();
        assert_eq!(
            result,
            Classification::RefMismatch {
                ref_type: Some("branch".to_owned())
            }
        );
    }

    #[test]
    fn missing_ref_type_is_ref_mismatch() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = json!({ "repository": { "name": "MyAddon" } });

        let result = classify("create", &payload, &registry).unwrap();
        assert_eq!(result, Classification::RefMismatch { ref_type: None });
    }

    #[test]
    fn ref_check_wins_over_registry_check() {
        // Unknown project AND branch ref: the ref mismatch is reported
        let registry = Registry::new();
        let payload = json!({
            "ref_type": "branch",
            "ref": "main",
            "repository": { "name": "Unknown" }
        });

        let result = classify("create", &payload, &registry).unwrap();
        assert!(matches!(result, Classification::RefMismatch { .. }));
    }

    #[test]
    fn unknown_project_is_reported_with_name() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = tag_payload("SomeoneElses", "v1.0.0");

        let result = classify("create", &payload, &registry).unwrap();
        assert_eq!(
            result,
            Classification::UnknownProject {
                name: "SomeoneElses".to_owned()
            }
        );
    }

    #[test]
    fn missing_repository_name_is_an_error() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = json!({ "ref_type": "tag", "ref": "v1.0.0" });

        let result = classify("create", &payload, &registry);
        assert_eq!(result, Err(ClassifyError::MissingField("repository.name")));
    }

    #[test]
    fn missing_ref_on_known_project_is_an_error() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = json!({
            "ref_type": "tag",
            "repository": { "name": "MyAddon" }
        });

        let result = classify("create", &payload, &registry);
        assert_eq!(result, Err(ClassifyError::MissingField("ref")));
    }

    #[test]
    fn membership_check_precedes_ref_extraction() {
        // Unknown project with a missing ref: the registry miss is reported,
        // not the missing field
        let registry = Registry::new();
        let payload = json!({
            "ref_type": "tag",
            "repository": { "name": "Unknown" }
        });

        let result = classify("create", &payload, &registry).unwrap();
        assert!(matches!(result, Classification::UnknownProject { .. }));
    }

    #[test]
    fn known_project_tag_is_accepted() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = tag_payload("MyAddon", "v1.2.0");

        let result = classify("create", &payload, &registry).unwrap();
        assert_eq!(
            result,
            Classification::Accept {
                name: "MyAddon".to_owned(),
                tag: "v1.2.0".to_owned()
            }
        );
    }

    #[test]
    fn registry_keys_are_case_sensitive() {
        let registry = registry_with(vec![project("MyAddon")]);
        let payload = tag_payload("myaddon", "v1.0.0");

        let result = classify("create", &payload, &registry).unwrap();
        assert!(matches!(result, Classification::UnknownProject { .. }));
    }

    proptest! {
        /// No event type other than "create" can ever be accepted.
        #[test]
        fn only_create_events_are_accepted(event in "[a-z_]{1,20}") {
            prop_assume!(event != EVENT_CREATE && event != EVENT_PING);

            let registry = registry_with(vec![project("MyAddon")]);
            let payload = tag_payload("MyAddon", "v1.0.0");

            let result = classify(&event, &payload, &registry).unwrap();
            prop_assert!(matches!(result, Classification::EventMismatch { .. }), "expected EventMismatch");
        }

        /// No ref type other than "tag" can ever be accepted.
        #[test]
        fn only_tag_refs_are_accepted(ref_type in "[a-z]{1,10}") {
            prop_assume!(ref_type != REF_TYPE_TAG);

            let registry = registry_with(vec![project("MyAddon")]);
            let payload = json!({
                "ref_type": ref_type,
                "ref": "v1.0.0",
                "repository": { "name": "MyAddon" }
            });

            let result = classify("create", &payload, &registry).unwrap();
            prop_assert!(matches!(result, Classification::RefMismatch { .. }), "expected RefMismatch");
        }
    }
}
