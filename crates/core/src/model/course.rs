use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems in a generated course document.
///
/// A generated document that trips any of these is rejected before it
/// reaches navigation or progress tracking; callers surface it as a
/// generation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course has no units")]
    NoUnits,

    #[error("unit {unit} has no lessons")]
    EmptyUnit { unit: usize },

    #[error("duplicate lesson id: {id}")]
    DuplicateLessonId { id: LessonId },

    #[error("question \"{prompt}\" has {got} options, expected 4")]
    WrongOptionCount { prompt: String, got: usize },

    #[error("question \"{prompt}\" marks correct answer as {got:?}, expected A-D")]
    InvalidAnswerMarker { prompt: String, got: String },
}

/// Every quiz question carries exactly this many answer options.
pub const QUESTION_OPTIONS: usize = 4;

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Marker for the correct option of a question, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    /// Parses a single-letter marker as emitted by the generator.
    #[must_use]
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// Position of the marked option within the options list.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

/// A validated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct: AnswerKey,
}

impl Question {
    /// The text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct.index()]
    }

    /// Checks a learner's answer by letter.
    #[must_use]
    pub fn is_correct(&self, answer: AnswerKey) -> bool {
        answer == self.correct
    }
}

//
// ─── LESSONS AND UNITS ─────────────────────────────────────────────────────────
//

/// Body of a single lesson: explanation, applied example, activity and a
/// short quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    #[serde(rename = "keyIdea")]
    pub key_idea: String,
    pub example: String,
    pub activity: String,
    pub quiz: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub content: LessonContent,
}

/// An ordered group of lessons. Unit order defines the curriculum sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub title: String,
    pub summary: String,
    pub lessons: Vec<Lesson>,
}

//
// ─── SOURCES ───────────────────────────────────────────────────────────────────
//

/// A reference the generator cited while building the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

impl Source {
    /// Hostname of the source URL, if it parses as one.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A complete generated curriculum.
///
/// Immutable once validated; the `id` is assigned at adoption time and is
/// the key for all persisted progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub level: String,
    pub duration: String,
    pub profile: String,
    pub objectives: Vec<String>,
    pub units: Vec<Unit>,
    #[serde(rename = "finalEvaluation")]
    pub final_evaluation: Vec<Question>,
    #[serde(rename = "finalProjects")]
    pub final_projects: Vec<String>,
    pub sources: Vec<Source>,
}

impl Course {
    /// Number of lessons across all units.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.units.iter().map(|u| u.lessons.len()).sum()
    }
}

/// Normalized form of a course title, used to deduplicate the saved-course
/// archive: lowercased, whitespace runs collapsed to a single underscore.
#[must_use]
pub fn title_key(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

//
// ─── DRAFT (GENERATOR WIRE SHAPE) ──────────────────────────────────────────────
//

/// Question as the generator emits it, before the answer marker is checked.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

impl QuestionDraft {
    fn validate(self) -> Result<Question, CourseError> {
        if self.options.len() != QUESTION_OPTIONS {
            return Err(CourseError::WrongOptionCount {
                prompt: self.text,
                got: self.options.len(),
            });
        }
        let Some(correct) = AnswerKey::from_letter(&self.correct_answer) else {
            return Err(CourseError::InvalidAnswerMarker {
                prompt: self.text,
                got: self.correct_answer,
            });
        };
        Ok(Question {
            text: self.text,
            options: self.options,
            correct,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonContentDraft {
    #[serde(rename = "keyIdea")]
    pub key_idea: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub quiz: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonDraft {
    pub id: String,
    pub title: String,
    pub content: LessonContentDraft,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitDraft {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
}

/// Unvalidated course document, mirroring the generator's JSON schema.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub units: Vec<UnitDraft>,
    #[serde(rename = "finalEvaluation", default)]
    pub final_evaluation: Vec<QuestionDraft>,
    #[serde(rename = "finalProjects", default)]
    pub final_projects: Vec<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl CourseDraft {
    /// Checks structural integrity and produces an adopted `Course`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the document is empty, a unit carries no
    /// lessons, a lesson id repeats, or any question violates the 4-option
    /// A-D contract.
    pub fn validate(self, id: CourseId) -> Result<Course, CourseError> {
        if self.title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if self.units.is_empty() {
            return Err(CourseError::NoUnits);
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut units = Vec::with_capacity(self.units.len());
        for (unit_idx, unit) in self.units.into_iter().enumerate() {
            if unit.lessons.is_empty() {
                return Err(CourseError::EmptyUnit { unit: unit_idx });
            }
            let mut lessons = Vec::with_capacity(unit.lessons.len());
            for lesson in unit.lessons {
                let lesson_id = LessonId::new(lesson.id);
                if !seen.insert(lesson_id.clone()) {
                    return Err(CourseError::DuplicateLessonId { id: lesson_id });
                }
                lessons.push(Lesson {
                    id: lesson_id,
                    title: lesson.title,
                    content: LessonContent {
                        key_idea: lesson.content.key_idea,
                        example: lesson.content.example,
                        activity: lesson.content.activity,
                        quiz: validate_questions(lesson.content.quiz)?,
                    },
                });
            }
            units.push(Unit {
                title: unit.title,
                summary: unit.summary,
                lessons,
            });
        }

        Ok(Course {
            id,
            title: self.title,
            description: self.description,
            level: self.level,
            duration: self.duration,
            profile: self.profile,
            objectives: self.objectives,
            units,
            final_evaluation: validate_questions(self.final_evaluation)?,
            final_projects: self.final_projects,
            sources: self.sources,
        })
    }
}

fn validate_questions(drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, CourseError> {
    drafts.into_iter().map(QuestionDraft::validate).collect()
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn question_draft(correct: &str) -> QuestionDraft {
        QuestionDraft {
            text: "What is ownership?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct.into(),
        }
    }

    fn lesson_draft(id: &str) -> LessonDraft {
        LessonDraft {
            id: id.into(),
            title: format!("Lesson {id}"),
            content: LessonContentDraft {
                key_idea: "idea".into(),
                example: "example".into(),
                activity: "activity".into(),
                quiz: vec![question_draft("A")],
            },
        }
    }

    fn draft_with_units(units: Vec<UnitDraft>) -> CourseDraft {
        CourseDraft {
            title: "Intro to Rust".into(),
            description: String::new(),
            level: "Beginner".into(),
            duration: "4 weeks".into(),
            profile: String::new(),
            objectives: vec![],
            units,
            final_evaluation: vec![question_draft("C")],
            final_projects: vec!["Build a CLI".into()],
            sources: vec![],
        }
    }

    #[test]
    fn validate_accepts_well_formed_document() {
        let draft = draft_with_units(vec![UnitDraft {
            title: "Unit 1".into(),
            summary: "basics".into(),
            lessons: vec![lesson_draft("1.1"), lesson_draft("1.2")],
        }]);

        let course = draft.validate(CourseId::generate()).unwrap();
        assert_eq!(course.total_lessons(), 2);
        assert_eq!(course.final_evaluation[0].correct, AnswerKey::C);
    }

    #[test]
    fn validate_rejects_empty_units() {
        let draft = draft_with_units(vec![]);
        assert_eq!(
            draft.validate(CourseId::generate()),
            Err(CourseError::NoUnits)
        );
    }

    #[test]
    fn validate_rejects_unit_without_lessons() {
        let draft = draft_with_units(vec![UnitDraft {
            title: "Unit 1".into(),
            summary: String::new(),
            lessons: vec![],
        }]);
        assert_eq!(
            draft.validate(CourseId::generate()),
            Err(CourseError::EmptyUnit { unit: 0 })
        );
    }

    #[test]
    fn validate_rejects_duplicate_lesson_ids() {
        let draft = draft_with_units(vec![UnitDraft {
            title: "Unit 1".into(),
            summary: String::new(),
            lessons: vec![lesson_draft("1.1"), lesson_draft("1.1")],
        }]);
        assert_eq!(
            draft.validate(CourseId::generate()),
            Err(CourseError::DuplicateLessonId {
                id: LessonId::new("1.1")
            })
        );
    }

    #[test]
    fn validate_rejects_bad_answer_marker() {
        let mut draft = draft_with_units(vec![UnitDraft {
            title: "Unit 1".into(),
            summary: String::new(),
            lessons: vec![lesson_draft("1.1")],
        }]);
        draft.final_evaluation = vec![question_draft("E")];
        assert!(matches!(
            draft.validate(CourseId::generate()),
            Err(CourseError::InvalidAnswerMarker { .. })
        ));
    }

    #[test]
    fn validate_rejects_wrong_option_count() {
        let mut q = question_draft("A");
        q.options.pop();
        let mut draft = draft_with_units(vec![UnitDraft {
            title: "Unit 1".into(),
            summary: String::new(),
            lessons: vec![lesson_draft("1.1")],
        }]);
        draft.units[0].lessons[0].content.quiz = vec![q];
        assert!(matches!(
            draft.validate(CourseId::generate()),
            Err(CourseError::WrongOptionCount { got: 3, .. })
        ));
    }

    #[test]
    fn title_key_collapses_whitespace_and_case() {
        assert_eq!(title_key("Intro  to\tRust "), "intro_to_rust");
        assert_eq!(title_key("INTRO TO RUST"), "intro_to_rust");
    }

    #[test]
    fn answer_key_indexes_options() {
        let q = Question {
            text: "q".into(),
            options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
            correct: AnswerKey::D,
        };
        assert_eq!(q.correct_option(), "z");
        assert!(q.is_correct(AnswerKey::D));
        assert!(!q.is_correct(AnswerKey::A));
    }

    #[test]
    fn source_host_parses_url() {
        let source = Source {
            title: "The Book".into(),
            url: "https://doc.rust-lang.org/book/".into(),
        };
        assert_eq!(source.host().as_deref(), Some("doc.rust-lang.org"));

        let broken = Source {
            title: "broken".into(),
            url: "not a url".into(),
        };
        assert_eq!(broken.host(), None);
    }

    #[test]
    fn course_serde_uses_generator_field_names() {
        let draft = draft_with_units(vec![UnitDraft {
            title: "Unit 1".into(),
            summary: String::new(),
            lessons: vec![lesson_draft("1.1")],
        }]);
        let course = draft.validate(CourseId::generate()).unwrap();
        let json = serde_json::to_string(&course).unwrap();
        assert!(json.contains("\"finalEvaluation\""));
        assert!(json.contains("\"keyIdea\""));
        let back: Course = serde_json::from_str(&json).unwrap();
        assert_eq!(back, course);
    }
}
