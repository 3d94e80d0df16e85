//! Persistence adapters: option stores and the LMS directory.

mod directory;
mod file_store;
mod memory_store;
mod options_document;

pub use directory::JsonDirectory;
pub use file_store::JsonFileOptionStore;
pub use memory_store::InMemoryOptionStore;
pub use options_document::{OptionsDocument, SCHEMA_VERSION, TransientEntry};
