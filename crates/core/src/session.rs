use thiserror::Error;

use crate::model::{Course, CourseId, Cursor, LessonId, ProgressRecord};
use crate::navigator::LessonNavigator;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("course has no lessons")]
    EmptyCourse,

    #[error("no lesson at unit {unit}, lesson {lesson}")]
    InvalidLessonReference { unit: usize, lesson: usize },

    #[error("lesson id not in this course: {id}")]
    UnknownLesson { id: LessonId },
}

//
// ─── VIEW STATE ────────────────────────────────────────────────────────────────
//

/// Where the learner currently is: a lesson, or the final-exam view.
///
/// The final exam is reachable and re-exitable; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Lesson { unit: usize, lesson: usize },
    FinalExam,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Navigation state machine for one course.
///
/// Composes the canonical lesson order with the learner's progress record.
/// Every transition that changes position rewrites the record's cursor, so
/// a caller persisting the record after each call gets durable
/// resume-from-last-position behavior. Boundary moves (previous at the
/// first lesson, next while already at the final exam) are defined no-ops,
/// not errors.
#[derive(Debug, Clone)]
pub struct CourseSession {
    course_id: CourseId,
    navigator: LessonNavigator,
    record: ProgressRecord,
}

impl CourseSession {
    /// Builds a session from a course and a (possibly restored) record.
    ///
    /// A restored cursor that points outside the current course shape, e.g.
    /// because the course was regenerated with fewer lessons, is clamped to
    /// the last lesson in canonical order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyCourse` if the course has no lessons;
    /// document validation normally rules this out.
    pub fn restore(course: &Course, mut record: ProgressRecord) -> Result<Self, SessionError> {
        let navigator = LessonNavigator::flatten(course);
        let Some(last) = navigator.entries().last() else {
            return Err(SessionError::EmptyCourse);
        };

        let cursor = record.cursor;
        if navigator.position_of(cursor.unit, cursor.lesson).is_none() {
            record.move_cursor(Cursor {
                unit: last.unit_idx,
                lesson: last.lesson_idx,
                at_final_exam: cursor.at_final_exam,
            });
        }

        Ok(Self {
            course_id: course.id,
            navigator,
            record,
        })
    }

    /// Starts a fresh session at the first lesson.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyCourse` if the course has no lessons.
    pub fn start(course: &Course) -> Result<Self, SessionError> {
        Self::restore(course, ProgressRecord::new())
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn view(&self) -> ViewState {
        let cursor = self.record.cursor;
        if cursor.at_final_exam {
            ViewState::FinalExam
        } else {
            ViewState::Lesson {
                unit: cursor.unit,
                lesson: cursor.lesson,
            }
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.record.cursor
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn navigator(&self) -> &LessonNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.navigator.len()
    }

    /// Completion percentage over all lessons of the course.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.record.progress_percent(self.navigator.len())
    }

    /// Forces the view to the given lesson, from any state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidLessonReference` if no lesson exists at
    /// that position.
    pub fn select_lesson(&mut self, unit: usize, lesson: usize) -> Result<(), SessionError> {
        if self.navigator.position_of(unit, lesson).is_none() {
            return Err(SessionError::InvalidLessonReference { unit, lesson });
        }
        self.record.move_cursor(Cursor {
            unit,
            lesson,
            at_final_exam: false,
        });
        Ok(())
    }

    /// Jumps straight to the final-exam view, keeping the lesson cursor.
    pub fn open_final_exam(&mut self) {
        let cursor = self.record.cursor;
        self.record.move_cursor(Cursor {
            at_final_exam: true,
            ..cursor
        });
    }

    /// Advances to the next lesson; past the last lesson this enters the
    /// final-exam view. Already at the final exam it is the "finish" no-op.
    pub fn go_next(&mut self) -> ViewState {
        let cursor = self.record.cursor;
        if !cursor.at_final_exam {
            match self.current_index().and_then(|i| self.navigator.next(i)) {
                Some(entry) => self.record.move_cursor(Cursor {
                    unit: entry.unit_idx,
                    lesson: entry.lesson_idx,
                    at_final_exam: false,
                }),
                None => self.open_final_exam(),
            }
        }
        self.view()
    }

    /// Steps back one lesson. From the final exam this returns to the
    /// lesson the cursor last pointed at; at the first lesson it is a no-op.
    pub fn go_previous(&mut self) -> ViewState {
        let cursor = self.record.cursor;
        if cursor.at_final_exam {
            self.record.move_cursor(Cursor {
                at_final_exam: false,
                ..cursor
            });
        } else if let Some(entry) = self.current_index().and_then(|i| self.navigator.previous(i)) {
            self.record.move_cursor(Cursor {
                unit: entry.unit_idx,
                lesson: entry.lesson_idx,
                at_final_exam: false,
            });
        }
        self.view()
    }

    /// Resumes at the first incomplete lesson, or the final exam when
    /// everything is complete.
    pub fn continue_learning(&mut self) -> ViewState {
        match self.navigator.first_incomplete(&self.record.completed) {
            Some(entry) => self.record.move_cursor(Cursor {
                unit: entry.unit_idx,
                lesson: entry.lesson_idx,
                at_final_exam: false,
            }),
            None => self.open_final_exam(),
        }
        self.view()
    }

    /// Flips completion of the given lesson. Returns whether it is complete
    /// after the toggle.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownLesson` if the id is not part of this
    /// course.
    pub fn toggle_completion(&mut self, id: &LessonId) -> Result<bool, SessionError> {
        if self.navigator.locate(id).is_none() {
            return Err(SessionError::UnknownLesson { id: id.clone() });
        }
        Ok(self.record.toggle(id))
    }

    fn current_index(&self) -> Option<usize> {
        let cursor = self.record.cursor;
        self.navigator.position_of(cursor.unit, cursor.lesson)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
