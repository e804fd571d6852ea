// src/core/storage/mod.rs

pub mod data_types;
pub mod keyspace;
pub mod stream;
pub mod zset;

pub use data_types::{DataValue, StoredValue, now_ms};
pub use keyspace::Keyspace;
