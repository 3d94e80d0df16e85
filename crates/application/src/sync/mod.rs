//! Enrollment event handling.

mod dispatcher;
mod enrollment_sync;

pub use dispatcher::{DispatchReport, EnrollmentDispatcher, EnrollmentSubscriber};
pub use enrollment_sync::{ContactResolution, EnrollmentSync, SkipReason, SyncOutcome};
