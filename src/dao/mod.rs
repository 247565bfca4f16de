//! Persistence layer: entities, the store abstraction, and backends.

pub mod memory;
pub mod models;
pub mod room_store;
pub mod storage;
