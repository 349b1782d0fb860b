use std::fmt;

use serde::{Deserialize, Serialize};

//
// ─── FORM INPUTS ───────────────────────────────────────────────────────────────
//

/// Self-reported experience level of the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StudentLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for StudentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StudentLevel::Beginner => "Beginner",
            StudentLevel::Intermediate => "Intermediate",
            StudentLevel::Advanced => "Advanced",
        };
        write!(f, "{label}")
    }
}

/// Content language for the generated course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
    Fr,
}

impl Language {
    /// English display name, used when instructing the generator.
    #[must_use]
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::Es => "Spanish",
            Language::En => "English",
            Language::Fr => "French",
        }
    }

    /// Two-letter code, e.g. for the profile sync payload.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
            Language::Fr => "fr",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            "fr" => Some(Language::Fr),
            _ => None,
        }
    }
}

/// What the learner asked for; input contract of the course generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRequest {
    pub topic: String,
    pub level: StudentLevel,
    pub profile: String,
    pub objective: String,
    pub available_time: String,
    pub format: String,
    pub language: Language,
}

//
// ─── USER PROFILE ──────────────────────────────────────────────────────────────
//

/// Singleton learner profile; created once, updated on resubmission, never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(rename = "avatarEmoji")]
    pub avatar: String,
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_roundtrip() {
        for lang in [Language::Es, Language::En, Language::Fr] {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("de"), None);
    }

    #[test]
    fn language_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
    }

    #[test]
    fn profile_keeps_browser_field_names() {
        let profile = UserProfile {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: "🦀".into(),
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"avatarEmoji\""));
    }
}
