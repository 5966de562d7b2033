/// `storage.local` backed archive store

use crate::error::ArchiveError;
use crate::storage::{ArchiveRecordSet, ArchiveStore};
use async_trait::async_trait;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStore;

#[async_trait(?Send)]
impl ArchiveStore for BrowserStore {
    async fn get(&self, key: &str) -> Result<Option<ArchiveRecordSet>, ArchiveError> {
        let value = getStorage(key)
            .await
            .map_err(|e| ArchiveError::store(format!("Failed to get storage: {:?}", e)))?;

        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }

        let values: Vec<serde_json::Value> = serde_wasm_bindgen::from_value(value)
            .map_err(|e| ArchiveError::store(format!("Failed to parse storage: {:?}", e)))?;

        Ok(Some(ArchiveRecordSet::from_stored(values)))
    }

    async fn set(&self, key: &str, records: &ArchiveRecordSet) -> Result<(), ArchiveError> {
        let value = serde_wasm_bindgen::to_value(records)
            .map_err(|e| ArchiveError::store(format!("Failed to serialize records: {:?}", e)))?;

        setStorage(key, value)
            .await
            .map_err(|e| ArchiveError::store(format!("Failed to save storage: {:?}", e)))
    }
}
