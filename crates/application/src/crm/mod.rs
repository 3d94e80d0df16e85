//! Salesforce REST access.

mod client;

pub use client::CrmClient;
