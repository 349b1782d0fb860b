use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use course_core::model::{Course, CourseId, ProgressRecord, UserProfile, title_key};

use crate::repository::{KeyValueStore, StorageError};

/// The saved-course archive never holds more than this many entries.
pub const MAX_SAVED_COURSES: usize = 5;

const SAVED_COURSES_KEY: &str = "saved_courses";
const PROFILE_KEY: &str = "user_profile";

fn progress_key(course_id: CourseId) -> String {
    format!("progress_{course_id}")
}

//
// ─── PROGRESS STORE ────────────────────────────────────────────────────────────
//

/// Persists one combined progress record per course.
///
/// Completed set and cursor live in a single JSON value written with one
/// `set`, so there is no window where they disagree. Unreadable or corrupt
/// stored JSON is reported as absent; the caller falls back to a fresh
/// record rather than failing the session.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the record for a course, or None when missing or corrupt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for store-level read failures; parse
    /// failures recover as `None`.
    pub async fn load(&self, course_id: CourseId) -> Result<Option<ProgressRecord>, StorageError> {
        let Some(raw) = self.kv.get(&progress_key(course_id)).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Persist the record with a single atomic write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save(
        &self,
        course_id: CourseId,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(record)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(&progress_key(course_id), &raw).await
    }
}

//
// ─── SAVED-COURSE ARCHIVE ──────────────────────────────────────────────────────
//

/// One archived course with the moment it was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCourse {
    pub saved_at: DateTime<Utc>,
    pub course: Course,
}

/// Most-recently-generated courses, newest first, at most one entry per
/// normalized title.
#[derive(Clone)]
pub struct CourseArchive {
    kv: Arc<dyn KeyValueStore>,
}

impl CourseArchive {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// All archived courses, newest first. Corrupt data reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for store-level read failures.
    pub async fn load(&self) -> Result<Vec<SavedCourse>, StorageError> {
        let Some(raw) = self.kv.get(SAVED_COURSES_KEY).await? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    /// Record a newly generated course at the front of the archive.
    ///
    /// An existing entry whose title normalizes to the same key is replaced;
    /// the list is then capped at `MAX_SAVED_COURSES`. Returns the updated
    /// archive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the archive cannot be read or written.
    pub async fn record(
        &self,
        course: &Course,
        now: DateTime<Utc>,
    ) -> Result<Vec<SavedCourse>, StorageError> {
        let key = title_key(&course.title);
        let mut entries = self.load().await?;
        entries.retain(|entry| title_key(&entry.course.title) != key);
        entries.insert(
            0,
            SavedCourse {
                saved_at: now,
                course: course.clone(),
            },
        );
        entries.truncate(MAX_SAVED_COURSES);

        let raw = serde_json::to_string(&entries)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(SAVED_COURSES_KEY, &raw).await?;
        Ok(entries)
    }
}

//
// ─── PROFILE STORE ─────────────────────────────────────────────────────────────
//

/// Singleton learner profile under a fixed key.
#[derive(Clone)]
pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the profile, or None when missing or corrupt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for store-level read failures.
    pub async fn load(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.kv.get(PROFILE_KEY).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Persist the profile (create or update; never deletes).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(profile)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(PROFILE_KEY, &raw).await
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Cursor, LessonId};
    use course_core::time::fixed_now;

    use crate::repository::InMemoryStore;

    fn course(title: &str) -> Course {
        use course_core::model::{CourseDraft, LessonContentDraft, LessonDraft, UnitDraft};
        CourseDraft {
            title: title.into(),
            description: String::new(),
            level: String::new(),
            duration: String::new(),
            profile: String::new(),
            objectives: vec![],
            units: vec![UnitDraft {
                title: "Unit 1".into(),
                summary: String::new(),
                lessons: vec![LessonDraft {
                    id: "1.1".into(),
                    title: "Lesson 1.1".into(),
                    content: LessonContentDraft {
                        key_idea: "idea".into(),
                        example: String::new(),
                        activity: String::new(),
                        quiz: vec![],
                    },
                }],
            }],
            final_evaluation: vec![],
            final_projects: vec![],
            sources: vec![],
        }
        .validate(CourseId::generate())
        .unwrap()
    }

    #[tokio::test]
    async fn progress_record_roundtrips_atomically() {
        let kv = Arc::new(InMemoryStore::new());
        let store = ProgressStore::new(kv.clone());
        let id = CourseId::generate();

        assert!(store.load(id).await.unwrap().is_none());

        let mut record = ProgressRecord::new();
        record.toggle(&LessonId::new("1.1"));
        record.move_cursor(Cursor {
            unit: 0,
            lesson: 1,
            at_final_exam: false,
        });
        store.save(id, &record).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), Some(record));
        // one key per course, completed set and cursor together
        assert!(kv.get(&format!("progress_{id}")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_progress_json_reads_as_absent() {
        let kv = Arc::new(InMemoryStore::new());
        let id = CourseId::generate();
        kv.insert_raw(&format!("progress_{id}"), "{not json");

        let store = ProgressStore::new(kv);
        assert!(store.load(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn archive_deduplicates_by_normalized_title_and_caps_at_five() {
        let kv = Arc::new(InMemoryStore::new());
        let archive = CourseArchive::new(kv);
        let now = fixed_now();

        for title in ["Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta"] {
            archive.record(&course(title), now).await.unwrap();
        }
        let entries = archive.load().await.unwrap();
        assert_eq!(entries.len(), MAX_SAVED_COURSES);
        assert_eq!(entries[0].course.title, "Zeta");
        // oldest entry fell off
        assert!(entries.iter().all(|e| e.course.title != "Alpha"));

        // same normalized title replaces and moves to the front
        let replacement = course("  zeta ");
        archive.record(&replacement, now).await.unwrap();
        let entries = archive.load().await.unwrap();
        assert_eq!(entries.len(), MAX_SAVED_COURSES);
        assert_eq!(entries[0].course.id, replacement.id);
        assert_eq!(
            entries
                .iter()
                .filter(|e| title_key(&e.course.title) == "zeta")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn profile_store_roundtrips_and_recovers_from_corruption() {
        let kv = Arc::new(InMemoryStore::new());
        let store = ProfileStore::new(kv.clone());

        assert!(store.load().await.unwrap().is_none());

        let profile = UserProfile {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: "🦀".into(),
        };
        store.save(&profile).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(profile));

        kv.insert_raw("user_profile", "][");
        assert!(store.load().await.unwrap().is_none());
    }
}
