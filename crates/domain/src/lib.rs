//! lmsforce Domain - Core business types
//!
//! This crate defines the domain model for the enrollment-to-Salesforce bridge.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod crm;
pub mod enrollment;
pub mod error;
pub mod http;
pub mod settings;

pub use auth::{ConnectionStatus, StatusNotice, TokenState, token_preview};
pub use crm::{CrmAccount, CrmContact, ObjectType, SObjectProperties};
pub use enrollment::{
    Course, CourseSnapshot, EnrollmentEvent, ExecutionContext, UserProfile, parse_course_price,
};
pub use error::{DomainError, DomainResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use settings::{Credentials, DEFAULT_LOGIN_URI, SalesforceSettings, sanitize_text_field};
