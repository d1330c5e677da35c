//! Downloadable resource handles.
//!
//! # Design
//! - Every bundle or fetched file is published once and addressed by an opaque handle.
//! - Handles stay live until explicitly released; the registry never reclaims on its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const HANDLE_PREFIX: &str = "blob:ffonline/";

/// Opaque reference to a published resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    fn generate() -> Self {
        Self(format!("{HANDLE_PREFIX}{}", Uuid::new_v4()))
    }

    /// String form of the handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Published payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Name the payload is offered under.
    pub name: String,
    /// Content type tag.
    pub content_type: String,
    /// Payload bytes.
    pub bytes: Arc<[u8]>,
}

/// Shared table of live resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: Arc<Mutex<HashMap<ResourceHandle, Resource>>>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `bytes` and return a fresh handle.
    pub fn publish(&self, name: &str, content_type: &str, bytes: Vec<u8>) -> ResourceHandle {
        let handle = ResourceHandle::generate();
        let resource = Resource {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        };
        debug!(handle = %handle, file = name, content_type, "resource published");
        self.lock().insert(handle.clone(), resource);
        handle
    }

    /// Release a handle. Returns `false` when it was unknown or already released.
    pub fn release(&self, handle: &ResourceHandle) -> bool {
        let released = self.lock().remove(handle).is_some();
        if released {
            debug!(handle = %handle, "resource released");
        }
        released
    }

    /// Look up a live resource.
    #[must_use]
    pub fn get(&self, handle: &ResourceHandle) -> Option<Resource> {
        self.lock().get(handle).cloned()
    }

    /// Number of handles that have not been released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceHandle, Resource>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_release_track_live_handles() {
        let registry = ResourceRegistry::new();
        let first = registry.publish("a.mp4", "video/mp4", vec![1, 2, 3]);
        let second = registry.publish("b.png", "image/png", vec![4]);
        assert_ne!(first, second);
        assert!(first.as_str().starts_with(HANDLE_PREFIX));
        assert_eq!(registry.live_handles(), 2);

        let resource = registry.get(&first);
        assert_eq!(resource.map(|res| res.bytes.len()), Some(3));

        assert!(registry.release(&first));
        assert!(!registry.release(&first));
        assert!(registry.get(&first).is_none());
        assert_eq!(registry.live_handles(), 1);
    }

    #[test]
    fn clones_share_the_table() {
        let registry = ResourceRegistry::new();
        let clone = registry.clone();
        let handle = clone.publish("out.gif", "image/gif", Vec::new());
        assert!(registry.release(&handle));
        assert_eq!(clone.live_handles(), 0);
    }
}
