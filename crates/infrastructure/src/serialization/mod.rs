//! Deterministic JSON serialization for the options file.
//!
//! Keeps the file readable and diff-friendly by:
//! - Sorting object keys alphabetically (via `BTreeMap` in stored types)
//! - Using 2-space indentation
//! - Adding trailing newline

mod json;

pub use json::*;
