//! State management module
//!
//! This module handles all persisted application state:
//! - Key-value slot backends, SQLite and in-memory (kv.rs)
//! - The location record and its validation rules (data.rs)
//! - The ordered location list and its persistence (store.rs)

pub mod data;
pub mod kv;
pub mod store;

pub use data::{Location, LocationDraft, LocationId, ValidationError, ValidationRules};
pub use kv::{KvError, KvStore, MemoryKv, SqliteKv};
pub use store::{LocationStore, StoreError};
