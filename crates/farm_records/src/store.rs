use field_gate::prelude::*;
use serde_json::json;
use tracing::info;

use crate::http::HttpRecordStore;

/// The record store the front ends talk to: the REST backend, or an
/// in-process store for `--offline` runs.
#[derive(Debug, Clone)]
pub enum RecordStore {
    Http(HttpRecordStore),
    Memory(MemoryStore),
}

impl RecordStore {
    /// In-memory store seeded with a few sample records.
    pub fn offline() -> Self {
        let store = MemoryStore::new();
        for record in sample_records() {
            let (resource, record) = record;
            store.seed(resource, record);
        }
        info!("using offline record store");
        RecordStore::Memory(store)
    }

    pub fn describe(&self) -> String {
        match self {
            RecordStore::Http(http) => http.base_url().to_string(),
            RecordStore::Memory(_) => "offline (in memory)".to_string(),
        }
    }
}

fn sample_records() -> Vec<(&'static str, Record)> {
    let samples = [
        (
            "yield",
            json!({
                "_id": "670000000000000000000001",
                "cropType": "Coconut",
                "harvestdate": "2024-10-10T00:00:00.000Z",
                "fieldNumber": "AA1",
                "quantity": 1200,
                "unit": "Kg",
                "treesPicked": 150,
                "storageLocation": "LL1",
            }),
        ),
        (
            "fertilizers",
            json!({"fertilizertype": "Urea", "quantity": 40, "unit": "Kg", "status": "In Stock"}),
        ),
        (
            "fertilizers",
            json!({"fertilizertype": "Urea", "quantity": 15, "unit": "Kg", "status": "Expired"}),
        ),
        (
            "fertilizers",
            json!({"fertilizertype": "Compost", "quantity": 0, "unit": "Kg", "status": "Out Of Stock"}),
        ),
    ];
    samples
        .into_iter()
        .filter_map(|(resource, value)| match value {
            serde_json::Value::Object(map) => Some((resource, map)),
            _ => None,
        })
        .collect()
}

impl PersistenceAdapter for RecordStore {
    async fn create(&self, resource: &str, payload: &Payload) -> Result<(), PersistenceError> {
        match self {
            RecordStore::Http(store) => store.create(resource, payload).await,
            RecordStore::Memory(store) => store.create(resource, payload).await,
        }
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<(), PersistenceError> {
        match self {
            RecordStore::Http(store) => store.update(resource, id, payload).await,
            RecordStore::Memory(store) => store.update(resource, id, payload).await,
        }
    }

    async fn get(&self, resource: &str, id: &str) -> Result<Record, PersistenceError> {
        match self {
            RecordStore::Http(store) => store.get(resource, id).await,
            RecordStore::Memory(store) => store.get(resource, id).await,
        }
    }

    async fn list(&self, resource: &str) -> Result<Vec<Record>, PersistenceError> {
        match self {
            RecordStore::Http(store) => store.list(resource).await,
            RecordStore::Memory(store) => store.list(resource).await,
        }
    }
}
