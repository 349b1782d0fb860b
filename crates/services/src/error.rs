//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::CourseError;
use course_core::session::SessionError;
use storage::repository::StorageError;

/// Errors emitted by course generators.
///
/// Everything here counts as a generation failure to the flow: no partial
/// course is ever adopted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("course generation is not configured")]
    Disabled,
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generator payload is not a course document: {0}")]
    MalformedDocument(String),
    #[error(transparent)]
    Invalid(#[from] CourseError),
}

/// Errors emitted by `StudyService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseFlow`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("a generation request is already in flight")]
    Busy,
    #[error("no saved course at index {index}")]
    UnknownSavedCourse { index: usize },
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
///
/// Remote sync failures are not errors; the profile is saved locally either
/// way and the save outcome reports whether sync went through.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
