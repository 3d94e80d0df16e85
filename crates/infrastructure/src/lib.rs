//! lmsforce infrastructure - adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{DEFAULT_TIMEOUT, ReqwestHttpClient, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use persistence::{InMemoryOptionStore, JsonDirectory, JsonFileOptionStore};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
