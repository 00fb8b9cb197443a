//! In-memory versioned store.

use crate::error::{Result, StoreError};
use crate::store::{key_hex, Key, Store, Transforms, Value};
use bytes::Bytes;
use corelib::{Occurred, VectorClock};
use dashmap::DashMap;
use std::collections::HashMap;

/// Versioned store kept in a concurrent map.
///
/// Each key holds a set of mutually concurrent versions. A put removes the
/// versions it supersedes and is rejected as obsolete if any stored version
/// is equal to or newer than it.
#[derive(Debug)]
pub struct InMemoryStore {
    name: String,
    entries: DashMap<Key, Vec<Value>>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &Key, _transforms: Option<&Bytes>) -> Result<Vec<Value>> {
        Ok(self
            .entries
            .get(key)
            .map(|versions| versions.value().clone())
            .unwrap_or_default())
    }

    fn get_versions(&self, key: &Key) -> Result<Vec<VectorClock>> {
        Ok(self
            .entries
            .get(key)
            .map(|versions| versions.iter().map(|v| v.version.clone()).collect())
            .unwrap_or_default())
    }

    fn get_all(&self, keys: &[Key], _transforms: Option<&Transforms>) -> Result<HashMap<Key, Vec<Value>>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(versions) = self.entries.get(key) {
                if !versions.is_empty() {
                    found.insert(key.clone(), versions.value().clone());
                }
            }
        }
        Ok(found)
    }

    fn put(&self, key: &Key, value: Value, _transforms: Option<&Bytes>) -> Result<()> {
        let mut versions = self.entries.entry(key.clone()).or_default();

        let mut superseded = Vec::new();
        for (index, existing) in versions.iter().enumerate() {
            match value.version.compare(&existing.version) {
                Occurred::Before | Occurred::Equal => {
                    return Err(StoreError::ObsoleteVersion(format!(
                        "key {} at {} is not newer than stored {}",
                        key_hex(key),
                        value.version,
                        existing.version
                    )));
                }
                Occurred::After => superseded.push(index),
                Occurred::Concurrently => {}
            }
        }

        for index in superseded.into_iter().rev() {
            versions.remove(index);
        }
        versions.push(value);
        Ok(())
    }

    fn delete(&self, key: &Key, version: &VectorClock) -> Result<bool> {
        let Some(mut versions) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        let before = versions.len();
        versions.retain(|v| !matches!(v.version.compare(version), Occurred::Before | Occurred::Equal));
        let removed = versions.len() != before;
        let now_empty = versions.is_empty();
        drop(versions);

        if now_empty {
            self.entries.remove_if(key, |_, versions| versions.is_empty());
        }
        Ok(removed)
    }
}
