//! Session-scoped key/value storage shared with the search page.

use super::record::{FitmentProductSet, VehicleRecord};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const VEHICLE_SEARCH_KEY: &str = "vehicleSearch";
pub const FITMENT_PRODUCTS_KEY: &str = "fitmentProducts";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
}

pub trait SessionStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

/// In-process session storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Writes both records, or neither. Serialization happens up front, and a
/// failed second write removes the first.
pub fn persist(
    store: &mut dyn SessionStore,
    vehicle: &VehicleRecord,
    products: &FitmentProductSet,
) -> Result<(), StoreError> {
    let vehicle_json = serde_json::to_string(vehicle)?;
    let products_json = serde_json::to_string(products)?;

    store.set(VEHICLE_SEARCH_KEY, vehicle_json)?;
    if let Err(e) = store.set(FITMENT_PRODUCTS_KEY, products_json) {
        store.remove(VEHICLE_SEARCH_KEY);
        return Err(e);
    }
    Ok(())
}

pub fn load_vehicle(store: &dyn SessionStore) -> Result<Option<VehicleRecord>, StoreError> {
    load(store, VEHICLE_SEARCH_KEY)
}

pub fn load_products(store: &dyn SessionStore) -> Result<Option<FitmentProductSet>, StoreError> {
    load(store, FITMENT_PRODUCTS_KEY)
}

fn load<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Result<Option<T>, StoreError> {
    store
        .get(key)
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::record::FitmentProduct;

    #[test]
    fn test_persist_then_load() {
        let mut store = MemorySessionStore::new();
        let vehicle = VehicleRecord {
            type_: "Car".into(),
            year: "2020".into(),
            make: "Honda".into(),
            model: "Civic".into(),
        };
        let products = FitmentProductSet::new(vec![FitmentProduct::new("A1")]);

        persist(&mut store, &vehicle, &products).unwrap();

        assert_eq!(load_vehicle(&store).unwrap(), Some(vehicle));
        assert_eq!(load_products(&store).unwrap(), Some(products));
        assert_eq!(
            store.get(VEHICLE_SEARCH_KEY).unwrap(),
            r#"{"type":"Car","year":"2020","make":"Honda","model":"Civic"}"#
        );
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemorySessionStore::new();
        let mut writer = store.clone();
        writer.set("k", "v".into()).unwrap();

        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert!(load_vehicle(&store).unwrap().is_none());
    }

    struct RejectingStore {
        inner: MemorySessionStore,
        reject: &'static str,
    }

    impl SessionStore for RejectingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            if key == self.reject {
                return Err(StoreError::Unavailable("quota exceeded".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_second_write_removes_first() {
        let inner = MemorySessionStore::new();
        let mut store = RejectingStore {
            inner: inner.clone(),
            reject: FITMENT_PRODUCTS_KEY,
        };
        let products = FitmentProductSet::new(vec![FitmentProduct::new("A1")]);

        let result = persist(&mut store, &VehicleRecord::default(), &products);

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(inner.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut store = MemorySessionStore::new();
        store.remove(VEHICLE_SEARCH_KEY);
        store.set("k", "v".into()).unwrap();
        store.remove("k");
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let mut store = MemorySessionStore::new();
        store.set(FITMENT_PRODUCTS_KEY, "{not json".into()).unwrap();
        assert!(matches!(
            load_products(&store),
            Err(StoreError::Serialization(_))
        ));
    }
}
