#![forbid(unsafe_code)]

pub mod error;
pub mod flow;
pub mod generator;
pub mod profile;
pub mod study;

pub use course_core::Clock;

pub use error::{FlowError, GenerationError, ProfileError, StudyError};
pub use flow::{CourseFlow, FlowView};
pub use generator::{ChatCourseGenerator, CourseGenerator, GeneratorConfig};
pub use profile::{ProfileSaved, ProfileService};
pub use study::StudyService;
