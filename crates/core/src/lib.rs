#![forbid(unsafe_code)]

pub mod model;
pub mod navigator;
pub mod session;
pub mod time;

pub use navigator::{FlatEntry, LessonNavigator};
pub use session::{CourseSession, SessionError, ViewState};
pub use time::Clock;
