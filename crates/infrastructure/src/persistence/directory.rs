//! LMS users and courses loaded from a JSON export.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use lmsforce_application::ports::{CourseCatalog, DirectoryError, UserDirectory};
use lmsforce_domain::{Course, UserProfile};
use serde::Deserialize;
use tokio::fs;

use crate::serialization::from_json_bytes;

#[derive(Debug, Default, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    users: Vec<UserProfile>,
    #[serde(default)]
    courses: Vec<Course>,
}

/// Read-only user and course lookup.
///
/// File format:
/// ```json
/// {
///   "users": [{ "id": 7, "email": "jane@x.com", "display_name": "Jane D" }],
///   "courses": [{ "id": 42, "title": "Intro to Go", "price": "$49.99" }]
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonDirectory {
    users: HashMap<u64, UserProfile>,
    courses: HashMap<u64, Course>,
}

impl JsonDirectory {
    /// Builds a directory from in-memory records.
    #[must_use]
    pub fn from_records(users: Vec<UserProfile>, courses: Vec<Course>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            courses: courses.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Loads a directory export.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, DirectoryError> {
        let bytes = fs::read(path).await?;
        let file: DirectoryFile =
            from_json_bytes(&bytes).map_err(|e| DirectoryError::Serialization(e.to_string()))?;
        tracing::info!(
            path = %path.display(),
            users = file.users.len(),
            courses = file.courses.len(),
            "Loaded LMS directory"
        );
        Ok(Self::from_records(file.users, file.courses))
    }
}

#[async_trait]
impl UserDirectory for JsonDirectory {
    async fn find_user(&self, user_id: u64) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl CourseCatalog for JsonDirectory {
    async fn find_course(&self, course_id: u64) -> Result<Option<Course>, DirectoryError> {
        Ok(self.courses.get(&course_id).cloned())
    }
}
