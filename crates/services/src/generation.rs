use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model_client::ContextRef;
use crate::prompt::{PromptLibrary, QUIZ_INSTRUCTION_JSON, SYSTEM_ROLE};

/// Default number of items requested per quiz.
pub const DEFAULT_ITEM_COUNT: u32 = 5;

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty: {0}")]
pub struct DifficultyError(String);

/// Requested quiz difficulty; the level tag fed to generation and recorded
/// in progress entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(DifficultyError(s.to_owned())),
        }
    }
}

//
// ─── REQUEST ──────────────────────────────────────────────────────────────────
//

/// Everything needed to ask the model for one quiz.
#[derive(Debug, Clone)]
pub struct GenerateQuizRequest {
    pub topic_text: String,
    pub level: Difficulty,
    pub n_items: u32,
    pub context: Vec<ContextRef>,
}

impl GenerateQuizRequest {
    #[must_use]
    pub fn new(topic_text: impl Into<String>) -> Self {
        Self {
            topic_text: topic_text.into(),
            level: Difficulty::default(),
            n_items: DEFAULT_ITEM_COUNT,
            context: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Difficulty) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_items(mut self, n_items: u32) -> Self {
        self.n_items = n_items;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Vec<ContextRef>) -> Self {
        self.context = context;
        self
    }
}

/// Assembles the quiz-generation prompt from the template sections and the
/// request. The closing directive matters: the model is told to emit nothing
/// but the JSON document (it still sometimes fences it, which the normalizer
/// tolerates).
#[must_use]
pub fn quiz_prompt(prompts: &PromptLibrary, request: &GenerateQuizRequest) -> String {
    let topic = request.topic_text.trim();
    let topic_block = if topic.is_empty() {
        "(see attached materials)"
    } else {
        topic
    };

    format!(
        "{role}\n\n\
         Learning topic/concepts:\n\
         ---\n\
         {topic_block}\n\
         ---\n\n\
         Quiz instructions:\n\
         {instructions}\n\n\
         Number of questions: {count}\n\
         Level: {level}\n\n\
         Return ONLY valid JSON matching the schema (no commentary, no markdown, no code fences).\n",
        role = prompts.section(SYSTEM_ROLE),
        instructions = prompts.section(QUIZ_INSTRUCTION_JSON),
        count = request.n_items,
        level = request.level,
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!(" hard ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn prompt_carries_topic_count_and_level() {
        let prompts = PromptLibrary::parse("[SYSTEM_ROLE]\nYou are a tutor.");
        let request = GenerateQuizRequest::new("Rust lifetimes")
            .with_level(Difficulty::Hard)
            .with_items(7);

        let prompt = quiz_prompt(&prompts, &request);
        assert!(prompt.starts_with("You are a tutor."));
        assert!(prompt.contains("Rust lifetimes"));
        assert!(prompt.contains("Number of questions: 7"));
        assert!(prompt.contains("Level: hard"));
        assert!(prompt.contains("ONLY valid JSON"));
    }

    #[test]
    fn blank_topic_points_at_attached_materials() {
        let prompt = quiz_prompt(&PromptLibrary::default(), &GenerateQuizRequest::new("   "));
        assert!(prompt.contains("(see attached materials)"));
    }
}
