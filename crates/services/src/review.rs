use std::sync::Arc;

use quiz_core::model::ProgressLedger;

use crate::error::ModelError;
use crate::model_client::{ContextRef, TextModel};
use crate::prompt::{PromptLibrary, REVIEW_TIPS, SYSTEM_ROLE};

/// Maximum number of characters of topic notes appended to a review prompt.
pub const CONTEXT_CAP: usize = 3000;

/// Builds post-quiz review recaps around the questions the learner missed.
#[derive(Clone)]
pub struct ReviewService {
    model: Arc<dyn TextModel>,
    prompts: PromptLibrary,
}

impl ReviewService {
    #[must_use]
    pub fn new(model: Arc<dyn TextModel>, prompts: PromptLibrary) -> Self {
        Self { model, prompts }
    }

    /// The review prompt for the ledger's missed items, or `None` when
    /// nothing was answered incorrectly and there is nothing to review.
    #[must_use]
    pub fn review_prompt(&self, ledger: &ProgressLedger, context_text: &str) -> Option<String> {
        let missed = ledger.missed_item_ids();
        if missed.is_empty() {
            return None;
        }

        let ids: Vec<&str> = missed.iter().map(|id| id.as_str()).collect();
        let mut prompt = format!(
            "{role}\n\n{tips}\n\n\
             Summarize the material behind these question ids (treat them as the difficult areas):\n\
             [{ids}]",
            role = self.prompts.section(SYSTEM_ROLE),
            tips = self.prompts.section(REVIEW_TIPS),
            ids = ids.join(", "),
        );

        let notes = context_text.trim();
        if !notes.is_empty() {
            prompt.push_str("\n\nTopic notes:\n");
            prompt.extend(notes.chars().take(CONTEXT_CAP));
        }
        Some(prompt)
    }

    /// Ask the model for a review recap of the missed questions.
    ///
    /// Returns `Ok(None)` when there is nothing to review.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` when the model call fails.
    pub async fn review(
        &self,
        ledger: &ProgressLedger,
        context_text: &str,
        context: &[ContextRef],
    ) -> Result<Option<String>, ModelError> {
        let Some(prompt) = self.review_prompt(ledger, context_text) else {
            return Ok(None);
        };
        let recap = self.model.generate(&prompt, context).await?;
        Ok(Some(recap))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
