use std::collections::BTreeSet;

use crate::model::{Course, LessonId};

//
// ─── FLAT ORDER ────────────────────────────────────────────────────────────────
//

/// One position in the canonical traversal order of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub unit_idx: usize,
    pub lesson_idx: usize,
    pub lesson_id: LessonId,
}

/// Total order over every lesson of a course: units in document order,
/// lessons within a unit in document order.
///
/// Pure function of the course; next/previous/resume semantics are all
/// answered against this order.
#[derive(Debug, Clone)]
pub struct LessonNavigator {
    entries: Vec<FlatEntry>,
}

impl LessonNavigator {
    /// Flattens the course's nested unit/lesson structure.
    #[must_use]
    pub fn flatten(course: &Course) -> Self {
        let entries = course
            .units
            .iter()
            .enumerate()
            .flat_map(|(unit_idx, unit)| {
                unit.lessons
                    .iter()
                    .enumerate()
                    .map(move |(lesson_idx, lesson)| FlatEntry {
                        unit_idx,
                        lesson_idx,
                        lesson_id: lesson.id.clone(),
                    })
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&FlatEntry> {
        self.entries.get(index)
    }

    /// Index of the first entry with the given lesson id.
    ///
    /// Duplicate ids cannot survive document validation, but if one slips
    /// through the first match wins.
    #[must_use]
    pub fn locate(&self, id: &LessonId) -> Option<usize> {
        self.entries.iter().position(|e| &e.lesson_id == id)
    }

    /// Index of the entry at the given (unit, lesson) position.
    #[must_use]
    pub fn position_of(&self, unit_idx: usize, lesson_idx: usize) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.unit_idx == unit_idx && e.lesson_idx == lesson_idx)
    }

    /// Entry after `current`, or None at the end of the course.
    #[must_use]
    pub fn next(&self, current: usize) -> Option<&FlatEntry> {
        self.entries.get(current + 1)
    }

    /// Entry before `current`, or None at the start of the course.
    #[must_use]
    pub fn previous(&self, current: usize) -> Option<&FlatEntry> {
        current.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// First lesson in canonical order absent from the completed set, or
    /// None when everything is complete.
    #[must_use]
    pub fn first_incomplete(&self, completed: &BTreeSet<LessonId>) -> Option<&FlatEntry> {
        self.entries
            .iter()
            .find(|e| !completed.contains(&e.lesson_id))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
