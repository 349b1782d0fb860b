use std::sync::Arc;

use course_core::Clock;
use course_core::model::{Course, CourseRequest};
use storage::records::CourseArchive;

use crate::error::FlowError;
use crate::generator::CourseGenerator;

/// Which top-level view the application is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowView {
    #[default]
    Home,
    Generating,
    Course,
}

/// Home / generating / course state machine around the generator call.
///
/// Generation suspends the flow: a second request while one is in flight is
/// rejected rather than queued. The in-flight window is an explicit
/// begin / adopt / cancel sequence, so a caller driving the generator
/// itself (or a test) observes the same `Generating` state that
/// `create_course` passes through. A failed generation restores the view
/// that was active before the request and adopts nothing; only a validated
/// course is archived and made active.
pub struct CourseFlow {
    generator: Arc<dyn CourseGenerator>,
    archive: CourseArchive,
    clock: Clock,
    view: FlowView,
    prior: FlowView,
    active: Option<Course>,
}

impl CourseFlow {
    #[must_use]
    pub fn new(generator: Arc<dyn CourseGenerator>, archive: CourseArchive, clock: Clock) -> Self {
        Self {
            generator,
            archive,
            clock,
            view: FlowView::Home,
            prior: FlowView::Home,
            active: None,
        }
    }

    #[must_use]
    pub fn view(&self) -> FlowView {
        self.view
    }

    /// The course currently being studied, if any.
    #[must_use]
    pub fn active_course(&self) -> Option<&Course> {
        self.active.as_ref()
    }

    /// Mark a generation as in flight.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Busy` if one already is.
    pub fn begin_generation(&mut self) -> Result<(), FlowError> {
        if self.view == FlowView::Generating {
            return Err(FlowError::Busy);
        }
        self.prior = self.view;
        self.view = FlowView::Generating;
        Ok(())
    }

    /// Abandon an in-flight generation and restore the previous view.
    pub fn cancel_generation(&mut self) {
        if self.view == FlowView::Generating {
            self.view = self.prior;
        }
    }

    /// Archive a generated course and make it active, ending the in-flight
    /// window.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Storage` when the archive write fails; the
    /// course is not adopted and the previous view is restored.
    pub async fn adopt_generated(&mut self, course: Course) -> Result<(), FlowError> {
        if let Err(err) = self.archive.record(&course, self.clock.now()).await {
            self.cancel_generation();
            return Err(err.into());
        }
        self.active = Some(course);
        self.view = FlowView::Course;
        Ok(())
    }

    /// Generate a course, archive it, and make it active.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Busy` while another generation is in flight,
    /// `FlowError::Generation` when the generator fails (the previous view
    /// and active course are kept), and `FlowError::Storage` when the
    /// archive write fails (the course is not adopted).
    pub async fn create_course(&mut self, request: &CourseRequest) -> Result<(), FlowError> {
        self.begin_generation()?;
        match self.generator.generate(request).await {
            Ok(course) => self.adopt_generated(course).await,
            Err(err) => {
                self.cancel_generation();
                Err(err.into())
            }
        }
    }

    /// Re-open a course from the saved archive by position (newest first).
    ///
    /// # Errors
    ///
    /// Returns `FlowError::UnknownSavedCourse` for an out-of-range index
    /// and `FlowError::Storage` if the archive cannot be read.
    pub async fn open_saved(&mut self, index: usize) -> Result<(), FlowError> {
        if self.view == FlowView::Generating {
            return Err(FlowError::Busy);
        }
        let mut entries = self.archive.load().await?;
        if index >= entries.len() {
            return Err(FlowError::UnknownSavedCourse { index });
        }
        self.active = Some(entries.swap_remove(index).course);
        self.view = FlowView::Course;
        Ok(())
    }

    /// Leave the active course and return home. Progress stays persisted.
    pub fn exit_course(&mut self) {
        self.active = None;
        self.view = FlowView::Home;
    }
}
