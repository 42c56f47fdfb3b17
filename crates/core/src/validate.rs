//! Standalone structural validation for canonical quizzes.
//!
//! The normalizer produces quizzes that already satisfy these invariants, but
//! the pass is usable on its own, e.g. on a quiz deserialized from elsewhere.
//! Unlike the normalizer, which stops at the first broken rule, validation
//! sweeps the whole quiz and reports every violation together.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::{OPTION_COUNT, Quiz};

//
// ─── VIOLATIONS ───────────────────────────────────────────────────────────────
//

/// The specific structural rule an item or quiz broke.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViolationRule {
    #[error("no item list (or not a sequence)")]
    MissingItems,
    #[error("missing question text")]
    MissingQuestion,
    #[error("question text is empty")]
    EmptyQuestion,
    #[error("expected {OPTION_COUNT} options, found {found}")]
    WrongOptionCount { found: usize },
    #[error("invalid answer designator: {found:?}")]
    InvalidAnswerLetter { found: String },
    #[error("missing integer answer_index")]
    MissingAnswerIndex,
    #[error("answer_index {found} is out of range 0-{}", OPTION_COUNT - 1)]
    AnswerIndexOutOfRange { found: i64 },
    #[error("duplicate item id {id:?}")]
    DuplicateId { id: String },
}

/// One rule violation, tied to an item index where applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Zero-based index of the offending item; `None` for quiz-level rules.
    pub item: Option<usize>,
    pub rule: ViolationRule,
}

impl Violation {
    #[must_use]
    pub fn quiz(rule: ViolationRule) -> Self {
        Self { item: None, rule }
    }

    #[must_use]
    pub fn item(index: usize, rule: ViolationRule) -> Self {
        Self {
            item: Some(index),
            rule,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Some(index) => write!(f, "item {index}: {}", self.rule),
            None => write!(f, "{}", self.rule),
        }
    }
}

//
// ─── SCHEMA ERROR ─────────────────────────────────────────────────────────────
//

/// Text parsed as JSON but violates the quiz schema.
///
/// Carries every violation found: one when raised by the normalizer (which
/// fails fast), possibly many when raised by `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub violations: Vec<Violation>,
}

impl SchemaError {
    #[must_use]
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quiz violates schema: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

//
// ─── VALIDATION PASS ──────────────────────────────────────────────────────────
//

/// Re-verifies the structural invariants of a canonical quiz.
///
/// Does not short-circuit: all violations are collected in a single pass and
/// reported together. An empty item list is accepted.
///
/// # Errors
///
/// Returns `SchemaError` listing every violating item index and rule.
pub fn validate(quiz: &Quiz) -> Result<(), SchemaError> {
    let mut violations = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for (index, item) in quiz.items.iter().enumerate() {
        if item.question.trim().is_empty() {
            violations.push(Violation::item(index, ViolationRule::EmptyQuestion));
        }
        if item.options.len() != OPTION_COUNT {
            violations.push(Violation::item(
                index,
                ViolationRule::WrongOptionCount {
                    found: item.options.len(),
                },
            ));
        }
        if item.answer_index >= OPTION_COUNT {
            violations.push(Violation::item(
                index,
                ViolationRule::AnswerIndexOutOfRange {
                    found: item.answer_index as i64,
                },
            ));
        }
        if !seen_ids.insert(item.id.as_str()) {
            violations.push(Violation::item(
                index,
                ViolationRule::DuplicateId {
                    id: item.id.as_str().to_owned(),
                },
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { violations })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemId, QuizItem};

    fn item(id: &str) -> QuizItem {
        QuizItem {
            id: ItemId::new(id),
            question: "What is borrowed?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer_index: 0,
            explanation: String::new(),
            tags: Vec::new(),
        }
    }

    fn quiz(items: Vec<QuizItem>) -> Quiz {
        Quiz {
            topic: "Ownership".into(),
            level: "easy".into(),
            items,
        }
    }

    #[test]
    fn canonical_quiz_passes() {
        let quiz = quiz(vec![item("q1"), item("q2")]);
        assert!(validate(&quiz).is_ok());
    }

    #[test]
    fn empty_quiz_passes() {
        assert!(validate(&quiz(Vec::new())).is_ok());
    }

    #[test]
    fn all_violations_are_collected_in_one_pass() {
        let mut bad_options = item("q1");
        bad_options.options.pop();
        let mut bad_index = item("q2");
        bad_index.answer_index = 5;
        let mut blank = item("q3");
        blank.question = "   ".into();
        let duplicate = item("q1");

        let err = validate(&quiz(vec![bad_options, bad_index, blank, duplicate])).unwrap_err();

        assert_eq!(err.violations.len(), 4);
        assert_eq!(
            err.violations[0],
            Violation::item(0, ViolationRule::WrongOptionCount { found: 3 })
        );
        assert_eq!(
            err.violations[1],
            Violation::item(1, ViolationRule::AnswerIndexOutOfRange { found: 5 })
        );
        assert_eq!(
            err.violations[2],
            Violation::item(2, ViolationRule::EmptyQuestion)
        );
        assert_eq!(
            err.violations[3],
            Violation::item(3, ViolationRule::DuplicateId { id: "q1".into() })
        );
    }

    #[test]
    fn display_names_every_item_index() {
        let mut bad = item("q1");
        bad.answer_index = 9;
        let err = validate(&quiz(vec![item("q0"), bad])).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("item 1"), "got: {text}");
        assert!(text.contains("out of range"), "got: {text}");
    }
}
