use chrono::{DateTime, Utc};

use quiz_core::model::{Choice, ItemId, ProgressLedger, Quiz, QuizItem};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── PHASE ────────────────────────────────────────────────────────────────────
//

/// Per-item progression phase of an active quiz session.
///
/// `Completed` is terminal for the current quiz; a fresh quiz gets a fresh
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Unanswered,
    Answered,
    Revealed,
    Completed,
}

//
// ─── SUBMITTED ANSWER ─────────────────────────────────────────────────────────
//

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub item_id: ItemId,
    pub choice: Choice,
    pub correct: bool,
    /// `false` when the ledger already held an entry for this item and the
    /// submission was deduplicated.
    pub recorded: bool,
}

//
// ─── QUIZ SESSION ─────────────────────────────────────────────────────────────
//

/// In-memory state machine driving a learner through one quiz.
///
/// Steps through the items sequentially: present, submit, reveal, advance.
/// Grading and progress recording happen entirely at the submit transition,
/// so progress lands even when the learner never reveals the explanation.
/// Exclusively owned by the active learning session; restarting means
/// dropping or replacing this value.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    current: usize,
    selected: Option<Choice>,
    phase: QuizPhase,
}

impl QuizSession {
    /// Create a session over an accepted quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for a zero-item quiz. The degenerate
    /// quiz is valid data; it just cannot be stepped through, so callers
    /// surface it as a warning instead of starting a session.
    pub fn new(quiz: Quiz) -> Result<Self, SessionError> {
        if quiz.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            quiz,
            current: 0,
            selected: None,
            phase: QuizPhase::Unanswered,
        })
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.quiz.topic
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.quiz.level
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn selected_choice(&self) -> Option<Choice> {
        self.selected
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&QuizItem> {
        self.quiz.items.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    /// Number of items already graded in this session.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        match self.phase {
            QuizPhase::Unanswered => self.current,
            QuizPhase::Answered | QuizPhase::Revealed => self.current + 1,
            QuizPhase::Completed => self.quiz.len(),
        }
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.quiz.len();
        let answered = self.answered_count();
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: self.is_complete(),
        }
    }

    /// Submit a choice for the current item and record the outcome.
    ///
    /// Grading is a single equality test against the item's answer index.
    /// Submitting again while the item is answered or revealed returns the
    /// original grading without touching the ledger, so a re-rendering UI
    /// can replay the call safely. The first answer is authoritative.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when no choice was supplied (the
    /// transition is refused, state unchanged) and `SessionError::Completed`
    /// once the quiz is done.
    pub fn submit(
        &mut self,
        choice: Option<Choice>,
        ledger: &mut ProgressLedger,
        now: DateTime<Utc>,
    ) -> Result<SubmittedAnswer, SessionError> {
        match self.phase {
            QuizPhase::Completed => Err(SessionError::Completed),
            QuizPhase::Answered | QuizPhase::Revealed => {
                // Duplicate application: return the original grading.
                let item = &self.quiz.items[self.current];
                let selected = self.selected.ok_or(SessionError::NoSelection)?;
                Ok(SubmittedAnswer {
                    item_id: item.id.clone(),
                    choice: selected,
                    correct: item.is_correct(selected),
                    recorded: false,
                })
            }
            QuizPhase::Unanswered => {
                let Some(choice) = choice else {
                    return Err(SessionError::NoSelection);
                };
                let item = &self.quiz.items[self.current];
                let correct = item.is_correct(choice);
                let recorded =
                    ledger.record(item.id.clone(), correct, self.quiz.level.clone(), now);

                self.selected = Some(choice);
                self.phase = QuizPhase::Answered;
                Ok(SubmittedAnswer {
                    item_id: item.id.clone(),
                    choice,
                    correct,
                    recorded,
                })
            }
        }
    }

    /// Expose the correct answer and explanation of the answered item.
    ///
    /// No side effects beyond the phase change; calling again while revealed
    /// is a no-op returning the same item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` before a submission and
    /// `SessionError::Completed` after the quiz is done.
    pub fn reveal(&mut self) -> Result<&QuizItem, SessionError> {
        match self.phase {
            QuizPhase::Unanswered => Err(SessionError::NotAnswered),
            QuizPhase::Completed => Err(SessionError::Completed),
            QuizPhase::Answered | QuizPhase::Revealed => {
                self.phase = QuizPhase::Revealed;
                Ok(&self.quiz.items[self.current])
            }
        }
    }

    /// Move to the next item, or complete the quiz when none remain.
    ///
    /// Clears the selection. Returns the next item, or `None` once the
    /// session is complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered`/`SessionError::NotRevealed` when
    /// the current item has not been answered and revealed yet, and
    /// `SessionError::Completed` after the quiz is done.
    pub fn advance(&mut self) -> Result<Option<&QuizItem>, SessionError> {
        match self.phase {
            QuizPhase::Unanswered => Err(SessionError::NotAnswered),
            QuizPhase::Answered => Err(SessionError::NotRevealed),
            QuizPhase::Completed => Err(SessionError::Completed),
            QuizPhase::Revealed => {
                self.selected = None;
                self.current += 1;
                if self.current >= self.quiz.len() {
                    self.phase = QuizPhase::Completed;
                } else {
                    self.phase = QuizPhase::Unanswered;
                }
                Ok(self.current_item())
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ItemId;
    use quiz_core::time::fixed_now;

    fn build_item(id: u64, answer_index: usize) -> QuizItem {
        QuizItem {
            id: ItemId::new(format!("q{id}")),
            question: format!("Question {id}?"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer_index,
            explanation: format!("Because {id}."),
            tags: Vec::new(),
        }
    }

    fn build_quiz(n: u64) -> Quiz {
        Quiz {
            topic: "Test".into(),
            level: "easy".into(),
            items: (1..=n).map(|id| build_item(id, 0)).collect(),
        }
    }

    #[test]
    fn empty_quiz_returns_error() {
        let err = QuizSession::new(build_quiz(0)).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn full_progression_ends_completed() {
        let mut ledger = ProgressLedger::new();
        let mut session = QuizSession::new(build_quiz(3)).unwrap();

        for step in 0..3 {
            assert_eq!(session.current_index(), step);
            assert_eq!(session.phase(), QuizPhase::Unanswered);
            session
                .submit(Some(Choice::A), &mut ledger, fixed_now())
                .unwrap();
            session.reveal().unwrap();
            session.advance().unwrap();
        }

        assert!(session.is_complete());
        assert_eq!(session.current_item(), None);
        assert_eq!(ledger.total_attempts(), 3);
        assert_eq!(ledger.total_correct(), 3);

        // No further submissions are accepted.
        let err = session
            .submit(Some(Choice::A), &mut ledger, fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Completed));
    }

    #[test]
    fn submit_without_choice_is_refused_and_state_kept() {
        let mut ledger = ProgressLedger::new();
        let mut session = QuizSession::new(build_quiz(1)).unwrap();

        let err = session.submit(None, &mut ledger, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NoSelection));
        assert_eq!(session.phase(), QuizPhase::Unanswered);
        assert_eq!(ledger.total_attempts(), 0);
    }

    #[test]
    fn grading_compares_against_answer_index() {
        let mut ledger = ProgressLedger::new();
        let quiz = Quiz {
            topic: "Test".into(),
            level: "medium".into(),
            items: vec![build_item(1, 2)],
        };
        let mut session = QuizSession::new(quiz).unwrap();

        let graded = session
            .submit(Some(Choice::B), &mut ledger, fixed_now())
            .unwrap();
        assert!(!graded.correct);
        assert!(graded.recorded);
        assert_eq!(ledger.total_correct(), 0);
        assert_eq!(ledger.history()[0].level, "medium");
    }

    #[test]
    fn duplicate_submit_records_once_and_keeps_first_grading() {
        let mut ledger = ProgressLedger::new();
        let mut session = QuizSession::new(build_quiz(1)).unwrap();

        let first = session
            .submit(Some(Choice::A), &mut ledger, fixed_now())
            .unwrap();
        assert!(first.correct);
        assert!(first.recorded);

        // Re-render replays the same submit.
        let replay = session
            .submit(Some(Choice::A), &mut ledger, fixed_now())
            .unwrap();
        assert!(replay.correct);
        assert!(!replay.recorded);

        // A different choice after the fact does not change the grading.
        let late_change = session
            .submit(Some(Choice::D), &mut ledger, fixed_now())
            .unwrap();
        assert_eq!(late_change.choice, Choice::A);
        assert!(late_change.correct);

        assert_eq!(ledger.total_attempts(), 1);
        assert_eq!(ledger.total_correct(), 1);
    }

    #[test]
    fn reveal_requires_an_answer_and_is_idempotent() {
        let mut ledger = ProgressLedger::new();
        let mut session = QuizSession::new(build_quiz(1)).unwrap();

        assert!(matches!(session.reveal(), Err(SessionError::NotAnswered)));

        session
            .submit(Some(Choice::A), &mut ledger, fixed_now())
            .unwrap();
        let item = session.reveal().unwrap();
        assert_eq!(item.explanation, "Because 1.");
        assert_eq!(session.phase(), QuizPhase::Revealed);

        // Revealing again changes nothing.
        session.reveal().unwrap();
        assert_eq!(session.phase(), QuizPhase::Revealed);
    }

    #[test]
    fn advance_requires_reveal_and_clears_selection() {
        let mut ledger = ProgressLedger::new();
        let mut session = QuizSession::new(build_quiz(2)).unwrap();

        assert!(matches!(session.advance(), Err(SessionError::NotAnswered)));
        session
            .submit(Some(Choice::B), &mut ledger, fixed_now())
            .unwrap();
        assert!(matches!(session.advance(), Err(SessionError::NotRevealed)));

        session.reveal().unwrap();
        let next = session.advance().unwrap();
        assert_eq!(next.unwrap().id, ItemId::new("q2"));
        assert_eq!(session.selected_choice(), None);
        assert_eq!(session.phase(), QuizPhase::Unanswered);
    }

    #[test]
    fn progress_view_tracks_the_cursor() {
        let mut ledger = ProgressLedger::new();
        let mut session = QuizSession::new(build_quiz(2)).unwrap();
        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 2,
                answered: 0,
                remaining: 2,
                is_complete: false
            }
        );

        session
            .submit(Some(Choice::A), &mut ledger, fixed_now())
            .unwrap();
        assert_eq!(session.progress().answered, 1);

        session.reveal().unwrap();
        session.advance().unwrap();
        session
            .submit(Some(Choice::A), &mut ledger, fixed_now())
            .unwrap();
        session.reveal().unwrap();
        session.advance().unwrap();
        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 2,
                answered: 2,
                remaining: 0,
                is_complete: true
            }
        );
    }
}
