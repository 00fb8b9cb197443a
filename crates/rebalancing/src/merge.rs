//! Merge-on-read: write proxied values into local storage.
//!
//! An obsolete-version outcome means the key was already migrated, or a
//! concurrent proxy fetch already wrote a version at least as new. It is
//! swallowed. Callers re-read local storage afterwards for the merged view.

use crate::error::Result;
use crate::store::{key_hex, Key, Store, Value};
use std::collections::HashMap;
use tracing::trace;

pub fn merge_locally<S: Store + ?Sized>(store: &S, key: &Key, values: &[Value]) -> Result<()> {
    for value in values {
        match store.put(key, value.clone(), None) {
            Ok(()) => {}
            Err(err) if err.is_obsolete_version() => {
                trace!(
                    store = store.name(),
                    key = %key_hex(key),
                    version = %value.version,
                    "proxied value already superseded locally"
                );
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

pub fn merge_all_locally<S: Store + ?Sized>(store: &S, fetched: &HashMap<Key, Vec<Value>>) -> Result<()> {
    for (key, values) in fetched {
        merge_locally(store, key, values)?;
    }
    Ok(())
}
