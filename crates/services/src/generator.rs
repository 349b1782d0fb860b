use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use course_core::model::{Course, CourseDraft, CourseId, CourseRequest};

use crate::error::GenerationError;

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Produces a complete course for a request, or fails.
///
/// The trait is the seam the flow depends on; tests substitute a fake.
#[async_trait]
pub trait CourseGenerator: Send + Sync {
    /// Generate and validate a course.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` for transport failures, malformed payloads
    /// and structurally invalid documents alike.
    async fn generate(&self, request: &CourseRequest) -> Result<Course, GenerationError>;
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

const DEFAULT_TIMEOUT_SECS: u64 = 120;

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("COURSE_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("COURSE_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("COURSE_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let timeout = env::var("COURSE_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);
        Some(Self {
            base_url,
            api_key,
            model,
            timeout,
        })
    }
}

//
// ─── CHAT-COMPLETIONS GENERATOR ────────────────────────────────────────────────
//

/// Course generator backed by an OpenAI-compatible chat-completions API.
///
/// Every request carries a timeout; a generator that never answers must
/// not suspend the session forever.
#[derive(Clone)]
pub struct ChatCourseGenerator {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl ChatCourseGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl CourseGenerator for ChatCourseGenerator {
    async fn generate(&self, request: &CourseRequest) -> Result<Course, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(request),
                },
            ],
            temperature: 0.4,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .timeout(config.timeout)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)?;

        parse_course_payload(&content)
    }
}

/// Extracts, parses and validates the course JSON from the model's reply.
///
/// Models occasionally wrap the JSON in markdown fences or prose, so the
/// text is trimmed to its outermost braces before parsing.
///
/// # Errors
///
/// Returns `GenerationError::MalformedDocument` when no JSON object is
/// present or it does not parse, and `GenerationError::Invalid` when the
/// parsed document fails structural validation.
pub fn parse_course_payload(text: &str) -> Result<Course, GenerationError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(GenerationError::MalformedDocument(
            "no JSON object in response".into(),
        ));
    };

    let draft: CourseDraft = serde_json::from_str(&text[start..=end])
        .map_err(|err| GenerationError::MalformedDocument(err.to_string()))?;
    Ok(draft.validate(CourseId::generate())?)
}

//
// ─── PROMPTS ───────────────────────────────────────────────────────────────────
//

const SYSTEM_INSTRUCTION: &str = "\
You are a senior instructional designer and expert teacher. Your mission \
is to build a structured course from the user's parameters.

CRITICAL RULES:
1. The tone must be didactic, approachable, motivating and professional. Never mention that you are an AI.
2. Use short, clear sentences. Avoid dense paragraphs.
3. For complex topics, use intuitive analogies.
4. The course must have between 6 and 8 units. Each unit between 3 and 5 lessons.
5. Every lesson MUST include: a key idea, a real/applied example, a practical activity, and a quick quiz of 3 questions.
6. Include a final evaluation (8-10 questions) and 2 project proposals.
7. Cite real, current sources for the material.
8. The generated content language MUST strictly match the requested one.";

fn build_prompt(request: &CourseRequest) -> String {
    format!(
        r#"Design a complete course with these parameters:
- Topic: {topic}
- Student level: {level}
- Student profile: {profile}
- Objective: {objective}
- Available time: {time}
- Format: {course_format}
- Content language: {language}

Return the answer strictly as JSON following this schema:
{{
  "title": "Course title",
  "description": "Short description",
  "level": "Level",
  "duration": "Duration",
  "profile": "Profile",
  "objectives": ["objective 1", "objective 2"],
  "units": [
    {{
      "title": "Unit title",
      "summary": "Summary",
      "lessons": [
        {{
          "id": "1.1",
          "title": "Lesson title",
          "content": {{
            "keyIdea": "Explanation",
            "example": "Real example",
            "activity": "Activity",
            "quiz": [
              {{ "text": "Question", "options": ["A", "B", "C", "D"], "correctAnswer": "A" }}
            ]
          }}
        }}
      ]
    }}
  ],
  "finalEvaluation": [ {{ "text": "Question", "options": ["A", "B", "C", "D"], "correctAnswer": "C" }} ],
  "finalProjects": ["Project A", "Project B"],
  "sources": [ {{ "title": "Source name", "url": "real_url" }} ]
}}"#,
        topic = request.topic,
        level = request.level,
        profile = request.profile,
        objective = request.objective,
        time = request.available_time,
        course_format = request.format,
        language = request.language.english_name(),
    )
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{AnswerKey, CourseError, Language, StudentLevel};

    const SAMPLE: &str = r#"{
        "title": "Intro to Rust",
        "description": "Learn the basics",
        "level": "Beginner",
        "duration": "4 weeks",
        "profile": "self-taught programmer",
        "objectives": ["read Rust", "write Rust"],
        "units": [
            {
                "title": "Getting Started",
                "summary": "tooling and syntax",
                "lessons": [
                    {
                        "id": "1.1",
                        "title": "Hello, cargo",
                        "content": {
                            "keyIdea": "cargo drives every project",
                            "example": "cargo new hello",
                            "activity": "create a project",
                            "quiz": [
                                {
                                    "text": "What builds a project?",
                                    "options": ["cargo build", "rustup", "gcc", "make"],
                                    "correctAnswer": "A"
                                }
                            ]
                        }
                    }
                ]
            }
        ],
        "finalEvaluation": [
            {
                "text": "Which keyword declares a binding?",
                "options": ["var", "let", "def", "dim"],
                "correctAnswer": "B"
            }
        ],
        "finalProjects": ["CLI tool"],
        "sources": [ { "title": "The Book", "url": "https://doc.rust-lang.org/book/" } ]
    }"#;

    #[test]
    fn parses_plain_json_payload() {
        let course = parse_course_payload(SAMPLE).unwrap();
        assert_eq!(course.title, "Intro to Rust");
        assert_eq!(course.total_lessons(), 1);
        assert_eq!(course.final_evaluation[0].correct, AnswerKey::B);
    }

    #[test]
    fn strips_markdown_fences_around_payload() {
        let wrapped = format!("Here is your course:\n```json\n{SAMPLE}\n```\nEnjoy!");
        let course = parse_course_payload(&wrapped).unwrap();
        assert_eq!(course.title, "Intro to Rust");
    }

    #[test]
    fn rejects_payload_without_json() {
        assert!(matches!(
            parse_course_payload("sorry, I cannot do that"),
            Err(GenerationError::MalformedDocument(_))
        ));
    }

    #[test]
    fn rejects_unparsable_json() {
        assert!(matches!(
            parse_course_payload("{\"title\": }"),
            Err(GenerationError::MalformedDocument(_))
        ));
    }

    #[test]
    fn surfaces_structural_validation_failures() {
        let empty = r#"{"title": "Empty", "units": []}"#;
        assert!(matches!(
            parse_course_payload(empty),
            Err(GenerationError::Invalid(CourseError::NoUnits))
        ));
    }

    #[test]
    fn prompt_carries_request_parameters_and_language() {
        let request = CourseRequest {
            topic: "Sourdough baking".into(),
            level: StudentLevel::Intermediate,
            profile: "home cook".into(),
            objective: "bake a loaf".into(),
            available_time: "2 hours a week".into(),
            format: "hands-on".into(),
            language: Language::Fr,
        };
        let prompt = build_prompt(&request);
        assert!(prompt.contains("Sourdough baking"));
        assert!(prompt.contains("Intermediate"));
        assert!(prompt.contains("French"));
        assert!(prompt.contains("\"correctAnswer\""));
    }

    #[tokio::test]
    async fn disabled_generator_refuses_requests() {
        let generator = ChatCourseGenerator::new(None);
        assert!(!generator.enabled());
        let request = CourseRequest {
            topic: "anything".into(),
            level: StudentLevel::Beginner,
            profile: String::new(),
            objective: String::new(),
            available_time: String::new(),
            format: String::new(),
            language: Language::Es,
        };
        assert!(matches!(
            generator.generate(&request).await,
            Err(GenerationError::Disabled)
        ));
    }
}
