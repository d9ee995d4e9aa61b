//! Remote record store contract.
//!
//! `PersistenceAdapter` is the only seam between the form engine and the
//! backend. Resources are REST collection names (`harvest`, `maintenance`,
//! `yield`); records are plain JSON objects.
//!
//! `MemoryStore` keeps everything in process. It backs the offline mode of the
//! binary and the tests, and can be told to fail the next call.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Payload;

/// A stored record as returned by the backend.
pub type Record = serde_json::Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistenceError {
    #[error("record `{0}` not found")]
    NotFound(String),

    /// The backend answered but refused the request (validation, duplicates).
    #[error("{message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// The backend could not be reached or answered garbage.
    #[error("transport error: {0}")]
    Transport(String),
}

impl PersistenceError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            PersistenceError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub trait PersistenceAdapter: Send + Sync {
    fn create(
        &self,
        resource: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    fn update(
        &self,
        resource: &str,
        id: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    fn get(
        &self,
        resource: &str,
        id: &str,
    ) -> impl Future<Output = Result<Record, PersistenceError>> + Send;

    fn list(&self, resource: &str)
        -> impl Future<Output = Result<Vec<Record>, PersistenceError>> + Send;
}

/// One call observed by a `MemoryStore`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create { resource: String, payload: Payload },
    Update { resource: String, id: String, payload: Payload },
    Get { resource: String, id: String },
    List { resource: String },
}

#[derive(Debug, Default)]
struct MemoryInner {
    collections: BTreeMap<String, Vec<Record>>,
    calls: Vec<StoreCall>,
    fail_next: Option<PersistenceError>,
    next_id: u64,
}

/// In-process record store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is. A missing `_id` is assigned.
    pub fn seed(&self, resource: &str, mut record: Record) -> String {
        let mut inner = self.lock();
        let id = match record.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = inner.assign_id();
                record.insert("_id".into(), Value::String(id.clone()));
                id
            }
        };
        inner
            .collections
            .entry(resource.to_string())
            .or_default()
            .push(record);
        id
    }

    /// Make the next adapter call fail with `err`.
    pub fn fail_next(&self, err: PersistenceError) {
        self.lock().fail_next = Some(err);
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn records(&self, resource: &str) -> Vec<Record> {
        self.lock()
            .collections
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, call: StoreCall) -> Result<std::sync::MutexGuard<'_, MemoryInner>, PersistenceError> {
        let mut inner = self.lock();
        debug!(?call, "memory store call");
        inner.calls.push(call);
        match inner.fail_next.take() {
            Some(err) => {
                warn!(%err, "memory store failing on request");
                Err(err)
            }
            None => Ok(inner),
        }
    }
}

impl MemoryInner {
    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }
}

impl PersistenceAdapter for MemoryStore {
    async fn create(&self, resource: &str, payload: &Payload) -> Result<(), PersistenceError> {
        let mut inner = self.begin(StoreCall::Create {
            resource: resource.to_string(),
            payload: payload.clone(),
        })?;
        let mut record = payload.clone();
        let id = inner.assign_id();
        record.insert("_id".into(), Value::String(id));
        inner
            .collections
            .entry(resource.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<(), PersistenceError> {
        let mut inner = self.begin(StoreCall::Update {
            resource: resource.to_string(),
            id: id.to_string(),
            payload: payload.clone(),
        })?;
        let record = inner
            .collections
            .get_mut(resource)
            .and_then(|records| records.iter_mut().find(|r| has_id(r, id)))
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        for (key, value) in payload {
            record.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn get(&self, resource: &str, id: &str) -> Result<Record, PersistenceError> {
        let inner = self.begin(StoreCall::Get {
            resource: resource.to_string(),
            id: id.to_string(),
        })?;
        inner
            .collections
            .get(resource)
            .and_then(|records| records.iter().find(|r| has_id(r, id)))
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    async fn list(&self, resource: &str) -> Result<Vec<Record>, PersistenceError> {
        let inner = self.begin(StoreCall::List {
            resource: resource.to_string(),
        })?;
        Ok(inner.collections.get(resource).cloned().unwrap_or_default())
    }
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get("_id").and_then(Value::as_str) == Some(id)
}
