//! Shared test utilities.

use std::sync::Mutex;

use crate::dispatch::{DispatchRequest, PackageSink};
use crate::registry::{ProjectDescriptor, Registry};

/// A sink that records every submitted request for assertion.
#[derive(Debug, Default)]
pub struct RecordingSink {
    requests: Mutex<Vec<DispatchRequest>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// Returns a copy of everything submitted so far.
    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PackageSink for RecordingSink {
    fn submit(&self, request: DispatchRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

/// A bare project descriptor with no tag and no metadata.
pub fn project(repo: &str) -> ProjectDescriptor {
    ProjectDescriptor {
        repo: repo.to_owned(),
        tag: None,
        metadata: serde_json::Map::new(),
    }
}

/// A registry pre-populated with the given projects.
pub fn registry_with(projects: Vec<ProjectDescriptor>) -> Registry {
    let registry = Registry::new();
    registry.replace(projects);
    registry
}
