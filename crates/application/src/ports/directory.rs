//! LMS lookup ports
//!
//! The host LMS owns users and courses; the sync only reads them.

use async_trait::async_trait;
use lmsforce_domain::{Course, UserProfile};

/// Errors that can occur while reading LMS records.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Resolves LMS users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by id. Returns `None` if the user does not exist.
    async fn find_user(&self, user_id: u64) -> Result<Option<UserProfile>, DirectoryError>;
}

/// Resolves LMS courses.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// Looks up a course by id. Returns `None` if the course does not exist.
    async fn find_course(&self, course_id: u64) -> Result<Option<Course>, DirectoryError>;
}
