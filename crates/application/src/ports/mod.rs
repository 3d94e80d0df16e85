//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod directory;
mod http_client;
mod option_store;

pub use clock::Clock;
pub use directory::{CourseCatalog, DirectoryError, UserDirectory};
pub use http_client::{HttpClient, HttpClientError};
pub use option_store::{OptionStore, StoreError};
