//! Fuzz target: persisted arming records
//!
//! Writes arbitrary bytes into both records and boots a store over them:
//! - No panics while decoding
//! - `load` always leaves the medium readable
//!
//! cargo fuzz run fuzz_state_store

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use zonewatch::app::ports::{StorageError, StoragePort};
use zonewatch::store::PersistentStateStore;

#[derive(Default)]
struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.data.get(&format!("{ns}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (armed, excludes) = rest.split_at(split);

    let mut medium = MemStore::default();
    let _ = medium.write("alarm", "armed", armed);
    let _ = medium.write("alarm", "excludes", excludes);

    let mut store = PersistentStateStore::new(medium);
    let loaded = store.load();
    assert_eq!(store.try_load().ok(), Some(loaded));
});
