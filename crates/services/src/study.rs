use course_core::model::{Course, LessonId};
use course_core::session::{CourseSession, ViewState};
use storage::records::ProgressStore;

use crate::error::StudyError;

/// Persisted navigation for one learner and one course.
///
/// Wraps the in-memory `CourseSession` state machine and writes the whole
/// progress record back to the store after every mutation, so the position
/// and completion set survive a process restart at any point.
#[derive(Clone)]
pub struct StudyService {
    progress: ProgressStore,
}

impl StudyService {
    #[must_use]
    pub fn new(progress: ProgressStore) -> Self {
        Self { progress }
    }

    /// Open (or resume) a session for the course.
    ///
    /// A persisted record is restored when present; missing or corrupt data
    /// falls back to a fresh record at the first lesson. A restored cursor
    /// that no longer fits the course shape is clamped by the session.
    ///
    /// # Errors
    ///
    /// Returns `StudyError` for storage read failures or a lesson-less
    /// course.
    pub async fn open(&self, course: &Course) -> Result<CourseSession, StudyError> {
        let record = self.progress.load(course.id).await?.unwrap_or_default();
        Ok(CourseSession::restore(course, record)?)
    }

    /// Flip completion of a lesson and persist.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Session` for ids outside the course and
    /// `StudyError::Storage` if the write fails.
    pub async fn toggle_completion(
        &self,
        session: &mut CourseSession,
        id: &LessonId,
    ) -> Result<bool, StudyError> {
        let now_complete = session.toggle_completion(id)?;
        self.persist(session).await?;
        Ok(now_complete)
    }

    /// Jump to an explicit lesson and persist the new cursor.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Session` if no lesson exists at that position.
    pub async fn select_lesson(
        &self,
        session: &mut CourseSession,
        unit: usize,
        lesson: usize,
    ) -> Result<ViewState, StudyError> {
        session.select_lesson(unit, lesson)?;
        self.persist(session).await?;
        Ok(session.view())
    }

    /// Advance one step (into the final exam past the last lesson) and
    /// persist.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` if the write fails.
    pub async fn go_next(&self, session: &mut CourseSession) -> Result<ViewState, StudyError> {
        let view = session.go_next();
        self.persist(session).await?;
        Ok(view)
    }

    /// Step back one lesson (or out of the final exam) and persist.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` if the write fails.
    pub async fn go_previous(&self, session: &mut CourseSession) -> Result<ViewState, StudyError> {
        let view = session.go_previous();
        self.persist(session).await?;
        Ok(view)
    }

    /// Resume at the first incomplete lesson (or the final exam) and
    /// persist.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` if the write fails.
    pub async fn continue_learning(
        &self,
        session: &mut CourseSession,
    ) -> Result<ViewState, StudyError> {
        let view = session.continue_learning();
        self.persist(session).await?;
        Ok(view)
    }

    /// Open the final-exam view directly and persist.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` if the write fails.
    pub async fn open_final_exam(
        &self,
        session: &mut CourseSession,
    ) -> Result<ViewState, StudyError> {
        session.open_final_exam();
        self.persist(session).await?;
        Ok(session.view())
    }

    async fn persist(&self, session: &CourseSession) -> Result<(), StudyError> {
        self.progress
            .save(session.course_id(), session.record())
            .await?;
        Ok(())
    }
}
