//! In-memory registry of packageable projects.
//!
//! The registry maps a project's repository name (case-sensitive, unique) to
//! its [`ProjectDescriptor`]. It is populated once at startup from the remote
//! manifest (see [`load`]) and afterwards mutated only by [`Registry::update_tag`]
//! when a trigger fires. Entries are never removed during the process
//! lifetime.
//!
//! Reads happen concurrently from every request handler; writes are a single
//! field overwrite. Overlapping updates to the same key are last-write-wins.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

pub mod load;

pub use load::{fetch_manifest, LoadError};

/// One packageable project, as declared in the remote manifest.
///
/// `repo` is the stable unique key. `tag` holds the most recent triggering
/// tag only: it is overwritten, not appended, on every trigger, and is absent
/// until the first one. Everything else the manifest declares (owner, build
/// options, …) is carried opaquely in `metadata` and handed to the packaging
/// pipeline untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub repo: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The shared project registry.
///
/// Interior mutability lets one registry value be read from every in-flight
/// request while startup (and triggers) write to it.
#[derive(Debug, Default)]
pub struct Registry {
    projects: RwLock<HashMap<String, ProjectDescriptor>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Replaces the registry contents with the given projects, keyed on `repo`.
    ///
    /// Called once at startup after a successful manifest load.
    pub fn replace(&self, projects: Vec<ProjectDescriptor>) {
        let map = projects
            .into_iter()
            .map(|p| (p.repo.clone(), p))
            .collect();
        *self.write() = map;
    }

    /// Returns a snapshot of the named project, or `None` if unknown.
    pub fn lookup(&self, name: &str) -> Option<ProjectDescriptor> {
        self.read().get(name).cloned()
    }

    /// Returns whether the named project is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Overwrites the `tag` field of the named project and returns a snapshot
    /// carrying the new tag, or `None` if the project is unknown.
    pub fn update_tag(&self, name: &str, tag: &str) -> Option<ProjectDescriptor> {
        let mut projects = self.write();
        let project = projects.get_mut(name)?;
        project.tag = Some(tag.to_owned());
        Some(project.clone())
    }

    /// Number of registered projects.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ProjectDescriptor>> {
        // A poisoned lock cannot hold a broken invariant here: the only
        // mutations are whole-map replacement and a single field store.
        self.projects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ProjectDescriptor>> {
        self.projects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
