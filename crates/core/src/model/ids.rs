use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a generated course.
///
/// Assigned when a generated document is adopted, never derived from the
/// course title, so two courses with colliding titles keep separate
/// progress records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(Uuid);

impl CourseId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID, e.g. one read back from storage.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Error type for parsing a `CourseId` from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCourseIdError;

impl fmt::Display for ParseCourseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse CourseId from string")
    }
}

impl std::error::Error for ParseCourseIdError {}

impl FromStr for CourseId {
    type Err = ParseCourseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(CourseId::from_uuid)
            .map_err(|_| ParseCourseIdError)
    }
}

/// Identifier of a lesson within a course, e.g. `"1.1"`.
///
/// The generator assigns these; uniqueness within a course is enforced at
/// document validation time. This is the join key between a lesson and its
/// completion state.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LessonId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_id_roundtrip() {
        let id = CourseId::generate();
        let parsed: CourseId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_course_id_from_str_invalid() {
        let result = "not-a-uuid".parse::<CourseId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_course_id_display_is_simple_form() {
        let id = CourseId::generate();
        assert!(!id.to_string().contains('-'));
    }

    #[test]
    fn test_lesson_id_display() {
        let id = LessonId::new("1.1");
        assert_eq!(id.to_string(), "1.1");
        assert_eq!(id.as_str(), "1.1");
    }

    #[test]
    fn test_lesson_ids_compare_by_value() {
        assert_eq!(LessonId::from("2.3"), LessonId::new("2.3"));
        assert_ne!(LessonId::from("2.3"), LessonId::new("3.2"));
    }
}
