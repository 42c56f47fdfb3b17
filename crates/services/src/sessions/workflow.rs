use std::sync::Arc;

use quiz_core::model::{Choice, ProgressLedger, Quiz};
use quiz_core::{Clock, normalize, validate};

use super::service::{QuizSession, SubmittedAnswer};
use crate::error::{GenerateError, SessionError};
use crate::generation::{GenerateQuizRequest, quiz_prompt};
use crate::model_client::TextModel;
use crate::prompt::PromptLibrary;

/// Orchestrates quiz generation and session stepping.
///
/// Stateless and cloneable: the caller owns the `QuizSession` and the
/// `ProgressLedger` and threads them through each call.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    model: Arc<dyn TextModel>,
    prompts: PromptLibrary,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, model: Arc<dyn TextModel>, prompts: PromptLibrary) -> Self {
        Self {
            clock,
            model,
            prompts,
        }
    }

    #[must_use]
    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    #[must_use]
    pub fn model(&self) -> Arc<dyn TextModel> {
        Arc::clone(&self.model)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Ask the model for a quiz and normalize + validate its reply.
    ///
    /// A structurally valid but empty quiz is returned as-is with a warning
    /// logged; the caller decides how to surface it.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::Model` for transport failures and
    /// `GenerateError::Quiz` when the reply cannot be normalized into the
    /// canonical schema.
    pub async fn generate_quiz(
        &self,
        request: &GenerateQuizRequest,
    ) -> Result<Quiz, GenerateError> {
        let prompt = quiz_prompt(&self.prompts, request);
        let raw = self.model.generate(&prompt, &request.context).await?;
        log::debug!("model returned {} bytes of quiz text", raw.len());

        let quiz = normalize(&raw, &request.topic_text, request.level.as_str())?;
        validate(&quiz).map_err(quiz_core::Error::from)?;

        if quiz.is_empty() {
            log::warn!("model produced an empty quiz for topic {:?}", quiz.topic);
        }
        Ok(quiz)
    }

    /// Start a session over an accepted quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for a zero-item quiz.
    pub fn begin(&self, quiz: Quiz) -> Result<QuizSession, SessionError> {
        QuizSession::new(quiz)
    }

    /// Submit a choice for the session's current item using the service clock.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from the submit transition.
    pub fn answer_current(
        &self,
        session: &mut QuizSession,
        ledger: &mut ProgressLedger,
        choice: Option<Choice>,
    ) -> Result<SubmittedAnswer, SessionError> {
        session.submit(choice, ledger, self.clock.now())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::time::fixed_clock;

    use crate::error::ModelError;
    use crate::model_client::ContextRef;

    struct CannedModel(&'static str);

    #[async_trait]
    impl TextModel for CannedModel {
        async fn generate(
            &self,
            _prompt: &str,
            _context: &[ContextRef],
        ) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    fn service(reply: &'static str) -> QuizLoopService {
        QuizLoopService::new(
            fixed_clock(),
            Arc::new(CannedModel(reply)),
            PromptLibrary::default(),
        )
    }

    #[tokio::test]
    async fn generates_and_runs_a_session() {
        let svc = service(
            r#"{"items": [{"question": "q", "options": ["a","b","c","d"], "answer_index": 0}]}"#,
        );
        let quiz = svc
            .generate_quiz(&GenerateQuizRequest::new("topic"))
            .await
            .unwrap();
        let mut session = svc.begin(quiz).unwrap();
        let mut ledger = ProgressLedger::new();

        let graded = svc
            .answer_current(&mut session, &mut ledger, Some(Choice::A))
            .unwrap();
        assert!(graded.correct);
        assert_eq!(ledger.total_attempts(), 1);
    }

    #[tokio::test]
    async fn empty_quiz_is_returned_not_rejected() {
        let svc = service(r#"{"items": []}"#);
        let quiz = svc
            .generate_quiz(&GenerateQuizRequest::new("topic"))
            .await
            .unwrap();
        assert!(quiz.is_empty());
        assert!(matches!(svc.begin(quiz), Err(SessionError::Empty)));
    }

    #[tokio::test]
    async fn unparseable_reply_surfaces_a_quiz_error() {
        let svc = service("the model rambled instead");
        let err = svc
            .generate_quiz(&GenerateQuizRequest::new("topic"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Quiz(quiz_core::Error::Parse(_))));
    }
}
