//! Enrollment event and the LMS records it refers to

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::expect_used)]
static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.]").expect("valid regex"));
#[allow(clippy::expect_used)]
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]*\.?[0-9]*").expect("valid regex"));

/// "Course access granted/updated for user U on course C."
///
/// Produced by the LMS, consumed once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentEvent {
    /// LMS user id.
    pub user_id: u64,
    /// LMS course id.
    pub course_id: u64,
    /// User ids with access to the course after the update.
    #[serde(default)]
    pub access_list: Vec<u64>,
    /// True when access is being revoked rather than granted.
    #[serde(default)]
    pub is_removal: bool,
}

impl EnrollmentEvent {
    /// Creates a grant event.
    #[must_use]
    pub const fn granted(user_id: u64, course_id: u64) -> Self {
        Self {
            user_id,
            course_id,
            access_list: Vec::new(),
            is_removal: false,
        }
    }

    /// Creates a revocation event.
    #[must_use]
    pub const fn revoked(user_id: u64, course_id: u64) -> Self {
        Self {
            user_id,
            course_id,
            access_list: Vec::new(),
            is_removal: true,
        }
    }
}

/// Where the triggering request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Administrative screens; enrollment sync is suppressed here.
    Admin,
    /// Learner-facing requests.
    #[default]
    Frontend,
}

impl ExecutionContext {
    /// Returns true for administrative requests.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// LMS user profile resolved for an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// LMS user id.
    pub id: u64,
    /// Primary email; the Contact lookup key.
    pub email: String,
    /// Public display name.
    pub display_name: String,
    /// Given name, may be empty.
    #[serde(default)]
    pub first_name: String,
    /// Family name, may be empty.
    #[serde(default)]
    pub last_name: String,
}

impl UserProfile {
    /// First name, or the display name when empty.
    #[must_use]
    pub fn first_name_or_display(&self) -> &str {
        if self.first_name.is_empty() {
            &self.display_name
        } else {
            &self.first_name
        }
    }

    /// Last name, or the display name when empty.
    #[must_use]
    pub fn last_name_or_display(&self) -> &str {
        if self.last_name.is_empty() {
            &self.display_name
        } else {
            &self.last_name
        }
    }
}

/// LMS course metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// LMS course id.
    pub id: u64,
    /// Course title.
    pub title: String,
    /// Price exactly as entered in the course settings, e.g. `"$49.99"`.
    #[serde(default)]
    pub price: String,
}

impl Course {
    /// Title and parsed price.
    #[must_use]
    pub fn snapshot(&self) -> CourseSnapshot {
        CourseSnapshot {
            title: self.title.clone(),
            price: parse_course_price(&self.price),
        }
    }
}

/// Course details captured at sync time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CourseSnapshot {
    /// Course title.
    pub title: String,
    /// Numeric price; 0.0 when the entered price is malformed.
    pub price: f64,
}

/// Parses a free-form course price.
///
/// Everything except digits and `.` is stripped, then the leading numeric
/// portion is parsed. Anything unparseable becomes `0.0`.
#[must_use]
pub fn parse_course_price(raw: &str) -> f64 {
    let digits = NON_NUMERIC.replace_all(raw, "");
    LEADING_NUMBER
        .find(&digits)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_course_price() {
        assert_eq!(parse_course_price("$49.99"), 49.99);
        assert_eq!(parse_course_price("USD 1,250.00"), 1250.0);
        assert_eq!(parse_course_price("120"), 120.0);
        assert_eq!(parse_course_price(".5"), 0.5);
        assert_eq!(parse_course_price("1.2.3"), 1.2);
    }

    #[test]
    fn test_parse_course_price_malformed_is_zero() {
        assert_eq!(parse_course_price(""), 0.0);
        assert_eq!(parse_course_price("free"), 0.0);
        assert_eq!(parse_course_price("."), 0.0);
    }

    #[test]
    fn test_name_fallbacks() {
        let user = UserProfile {
            id: 7,
            email: "jane@x.com".to_string(),
            display_name: "Jane D".to_string(),
            first_name: String::new(),
            last_name: "Doe".to_string(),
        };
        assert_eq!(user.first_name_or_display(), "Jane D");
        assert_eq!(user.last_name_or_display(), "Doe");
    }

    #[test]
    fn test_event_deserialization_defaults() {
        let event: EnrollmentEvent =
            serde_json::from_str(r#"{"user_id": 1, "course_id": 42}"#).unwrap();
        assert_eq!(event, EnrollmentEvent::granted(1, 42));
        assert!(EnrollmentEvent::revoked(1, 42).is_removal);
    }

    #[test]
    fn test_course_snapshot() {
        let course = Course {
            id: 42,
            title: "Intro to Go".to_string(),
            price: "$49.99".to_string(),
        };
        let snapshot = course.snapshot();
        assert_eq!(snapshot.title, "Intro to Go");
        assert_eq!(snapshot.price, 49.99);
    }
}
