//! Authentication domain types

mod types;

pub use types::{ConnectionStatus, StatusNotice, TokenState, token_preview};
