mod course;
mod ids;
mod progress;
mod request;

pub use course::{
    AnswerKey, Course, CourseDraft, CourseError, Lesson, LessonContent, LessonContentDraft,
    LessonDraft, Question, QuestionDraft, Source, Unit, UnitDraft, QUESTION_OPTIONS, title_key,
};
pub use ids::{CourseId, LessonId, ParseCourseIdError};
pub use progress::{Cursor, ProgressRecord};
pub use request::{CourseRequest, Language, StudentLevel, UserProfile};
