use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;

//
// ─── CURSOR ────────────────────────────────────────────────────────────────────
//

/// Last-viewed position within a course.
///
/// Serialized field names (`u`, `l`, `f`) are the wire shape the browser
/// version wrote to local storage; kept so existing records stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "u")]
    pub unit: usize,
    #[serde(rename = "l")]
    pub lesson: usize,
    #[serde(rename = "f")]
    pub at_final_exam: bool,
}

impl Cursor {
    /// Cursor at the first lesson of a course.
    #[must_use]
    pub fn start() -> Self {
        Self {
            unit: 0,
            lesson: 0,
            at_final_exam: false,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Completion state and cursor for one course.
///
/// Completion and position are held in a single record so persistence can
/// write them with one atomic `set`; the browser original used two
/// independent keys and could leave them inconsistent between writes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub completed: BTreeSet<LessonId>,
    pub cursor: Cursor,
}

impl ProgressRecord {
    /// Fresh record: nothing completed, cursor at the first lesson.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id` in the completed set.
    ///
    /// Calling twice restores the original membership. Returns whether the
    /// lesson is complete after the toggle.
    pub fn toggle(&mut self, id: &LessonId) -> bool {
        if self.completed.remove(id) {
            false
        } else {
            self.completed.insert(id.clone());
            true
        }
    }

    #[must_use]
    pub fn is_complete(&self, id: &LessonId) -> bool {
        self.completed.contains(id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Overwrites the cursor.
    pub fn move_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Completion as an integer percentage, rounded.
    ///
    /// A course with zero lessons reports 0, never a division by zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn progress_percent(&self, total_lessons: usize) -> u8 {
        if total_lessons == 0 {
            return 0;
        }
        let ratio = self.completed.len() as f64 / total_lessons as f64;
        (ratio * 100.0).round().min(100.0) as u8
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_membership() {
        let mut record = ProgressRecord::new();
        let id = LessonId::new("1.1");

        assert!(record.toggle(&id));
        assert!(record.is_complete(&id));
        assert!(!record.toggle(&id));
        assert!(!record.is_complete(&id));
        assert_eq!(record.completed_count(), 0);
    }

    #[test]
    fn progress_percent_rounds_and_handles_zero_total() {
        let mut record = ProgressRecord::new();
        assert_eq!(record.progress_percent(0), 0);
        assert_eq!(record.progress_percent(4), 0);

        record.toggle(&LessonId::new("1.1"));
        assert_eq!(record.progress_percent(4), 25);
        assert_eq!(record.progress_percent(3), 33);

        record.toggle(&LessonId::new("1.2"));
        record.toggle(&LessonId::new("2.1"));
        record.toggle(&LessonId::new("2.2"));
        assert_eq!(record.progress_percent(4), 100);
    }

    #[test]
    fn progress_percent_is_monotonic() {
        let mut record = ProgressRecord::new();
        let mut last = 0;
        for id in ["1.1", "1.2", "2.1", "2.2", "3.1"] {
            record.toggle(&LessonId::new(id));
            let pct = record.progress_percent(5);
            assert!(pct >= last);
            last = pct;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn cursor_wire_shape_matches_browser_records() {
        let record = ProgressRecord {
            completed: [LessonId::new("1.1")].into_iter().collect(),
            cursor: Cursor {
                unit: 0,
                lesson: 1,
                at_final_exam: false,
            },
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"u\":0"));
        assert!(json.contains("\"l\":1"));
        assert!(json.contains("\"f\":false"));

        let back: ProgressRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
