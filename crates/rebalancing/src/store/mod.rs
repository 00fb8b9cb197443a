//! The store capability decorated by the redirecting layer.

pub mod memory;

pub use memory::InMemoryStore;

use crate::error::Result;
use bytes::Bytes;
use corelib::{VectorClock, Versioned};
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque immutable key; equality and hashing are by content.
pub type Key = Bytes;

/// Versioned payload as stored and returned by stores.
pub type Value = Versioned<Bytes>;

/// Per-key transform payloads for batch reads.
pub type Transforms = HashMap<Key, Bytes>;

/// Versioned key-value store.
///
/// Implemented by local storage engines, by remote store handles and by
/// decorators such as `RedirectingStore`.
pub trait Store: Send + Sync {
    fn name(&self) -> &str;

    /// All versions stored for `key`; empty when absent.
    fn get(&self, key: &Key, transforms: Option<&Bytes>) -> Result<Vec<Value>>;

    fn get_versions(&self, key: &Key) -> Result<Vec<VectorClock>>;

    /// Versions for every key that has any. Absent keys are omitted.
    fn get_all(&self, keys: &[Key], transforms: Option<&Transforms>) -> Result<HashMap<Key, Vec<Value>>>;

    /// Store `value`, failing with `ObsoleteVersion` unless its version is
    /// newer than or concurrent with every stored version.
    fn put(&self, key: &Key, value: Value, transforms: Option<&Bytes>) -> Result<()>;

    /// Delete versions of `key` not newer than `version`. Returns whether
    /// anything was removed.
    fn delete(&self, key: &Key, version: &VectorClock) -> Result<bool>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &Key, transforms: Option<&Bytes>) -> Result<Vec<Value>> {
        (**self).get(key, transforms)
    }

    fn get_versions(&self, key: &Key) -> Result<Vec<VectorClock>> {
        (**self).get_versions(key)
    }

    fn get_all(&self, keys: &[Key], transforms: Option<&Transforms>) -> Result<HashMap<Key, Vec<Value>>> {
        (**self).get_all(keys, transforms)
    }

    fn put(&self, key: &Key, value: Value, transforms: Option<&Bytes>) -> Result<()> {
        (**self).put(key, value, transforms)
    }

    fn delete(&self, key: &Key, version: &VectorClock) -> Result<bool> {
        (**self).delete(key, version)
    }
}

/// Hex rendering of a key for log fields.
pub(crate) fn key_hex(key: &[u8]) -> String {
    hex::encode(key)
}
