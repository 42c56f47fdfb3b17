use std::sync::Arc;

use crate::error::ModelError;
use crate::model_client::{ContextRef, TextModel};
use crate::prompt::{PromptLibrary, SYSTEM_ROLE};

/// Number of most-recent turns included when prompting the model.
pub const CHAT_WINDOW: usize = 12;

//
// ─── TRANSCRIPT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    Student,
    Assistant,
}

impl ChatRole {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            ChatRole::Student => "Student",
            ChatRole::Assistant => "Study buddy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Append-only conversation transcript.
///
/// The chat loop makes no structural guarantees; turns accumulate and only
/// the most recent window is shown to the model.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    turns: Vec<ChatTurn>,
}

impl ChatLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_student(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: ChatRole::Student,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: ChatRole::Assistant,
            content: content.into(),
        });
    }

    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The last `n` turns in chronological order.
    #[must_use]
    pub fn window(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

//
// ─── CHAT SERVICE ─────────────────────────────────────────────────────────────
//

/// Turn-append chat over the study material.
#[derive(Clone)]
pub struct ChatService {
    model: Arc<dyn TextModel>,
    prompts: PromptLibrary,
}

impl ChatService {
    #[must_use]
    pub fn new(model: Arc<dyn TextModel>, prompts: PromptLibrary) -> Self {
        Self { model, prompts }
    }

    /// Append the student's message, ask the model, append and return the reply.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` when the model call fails; the student's turn
    /// stays in the log so a retry resends it.
    pub async fn reply(
        &self,
        log: &mut ChatLog,
        message: impl Into<String>,
        context: &[ContextRef],
    ) -> Result<String, ModelError> {
        log.push_student(message);
        let prompt = transcript_prompt(&self.prompts, log);
        let reply = self.model.generate(&prompt, context).await?;
        log.push_assistant(reply.clone());
        Ok(reply)
    }
}

fn transcript_prompt(prompts: &PromptLibrary, log: &ChatLog) -> String {
    let mut prompt = String::from(prompts.section(SYSTEM_ROLE));
    for turn in log.window(CHAT_WINDOW) {
        prompt.push_str("\n\n");
        prompt.push_str(turn.role.prefix());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
    }
    prompt
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoModel;

    #[async_trait]
    impl TextModel for EchoModel {
        async fn generate(
            &self,
            prompt: &str,
            _context: &[ContextRef],
        ) -> Result<String, ModelError> {
            Ok(format!("echo of {} chars", prompt.len()))
        }
    }

    #[test]
    fn window_keeps_only_the_most_recent_turns() {
        let mut log = ChatLog::new();
        for i in 0..20 {
            log.push_student(format!("message {i}"));
        }

        let window = log.window(CHAT_WINDOW);
        assert_eq!(window.len(), 12);
        assert_eq!(window[0].content, "message 8");
        assert_eq!(window[11].content, "message 19");
    }

    #[test]
    fn transcript_prefixes_both_roles() {
        let mut log = ChatLog::new();
        log.push_student("what is a trait?");
        log.push_assistant("an interface with teeth");

        let prompts = PromptLibrary::parse("[SYSTEM_ROLE]\nBe helpful.");
        let prompt = transcript_prompt(&prompts, &log);
        assert!(prompt.starts_with("Be helpful."));
        assert!(prompt.contains("Student: what is a trait?"));
        assert!(prompt.contains("Study buddy: an interface with teeth"));
    }

    #[tokio::test]
    async fn reply_appends_both_turns() {
        let service = ChatService::new(Arc::new(EchoModel), PromptLibrary::default());
        let mut log = ChatLog::new();

        let reply = service.reply(&mut log, "hello", &[]).await.unwrap();
        assert_eq!(log.turns().len(), 2);
        assert_eq!(log.turns()[0].role, ChatRole::Student);
        assert_eq!(log.turns()[1].role, ChatRole::Assistant);
        assert_eq!(log.turns()[1].content, reply);
    }
}
