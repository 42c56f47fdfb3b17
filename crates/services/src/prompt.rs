use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Section holding the assistant persona used by every model call.
pub const SYSTEM_ROLE: &str = "SYSTEM_ROLE";
/// Section describing the JSON quiz schema the model must emit.
pub const QUIZ_INSTRUCTION_JSON: &str = "QUIZ_INSTRUCTION_JSON";
/// Section with rephrasing guidance for the chat mode.
pub const REPHRASE_INSTRUCTION: &str = "REPHRASE_INSTRUCTION";
/// Section with guidance for post-quiz review summaries.
pub const REVIEW_TIPS: &str = "REVIEW_TIPS";

/// Named prompt sections loaded from a plain-text template file.
///
/// The file format is a sequence of `[SECTION]` header lines, each starting a
/// block that runs until the next header. Unknown section names are kept, so
/// template files can grow without code changes.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    sections: HashMap<String, String>,
}

impl PromptLibrary {
    /// Loads a section file. A missing or unreadable file yields an empty
    /// library; every section then resolves to the empty string.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        fs::read_to_string(path)
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }

    /// Parses the `[SECTION]` format from an in-memory string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut sections = HashMap::new();
        let mut current: Option<String> = None;
        let mut buf: Vec<&str> = Vec::new();

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
                if let Some(name) = current.take() {
                    sections.insert(name, buf.join("\n").trim().to_owned());
                }
                current = Some(trimmed[1..trimmed.len() - 1].to_owned());
                buf.clear();
            } else {
                buf.push(line);
            }
        }
        if let Some(name) = current {
            sections.insert(name, buf.join("\n").trim().to_owned());
        }

        Self { sections }
    }

    /// The text of a section, or `""` when absent.
    #[must_use]
    pub fn section(&self, name: &str) -> &str {
        self.sections.get(name).map_or("", String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
