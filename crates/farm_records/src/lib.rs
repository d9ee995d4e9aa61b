//! Plantation back office records on top of `field_gate`.
//!
//! - forms: harvest schedule, maintenance and yield record form definitions
//! - http: `HttpRecordStore`, the REST implementation of `PersistenceAdapter`
//! - store: `RecordStore`, switching between REST and the offline memory store
//! - inventory: fertilizer stock level alert

pub mod forms;
pub mod http;
pub mod inventory;
pub mod store;

pub use forms::{FormKind, registry};
pub use http::{ClientError, HttpRecordStore};
pub use inventory::{StockLevel, check_stock};
pub use store::RecordStore;
