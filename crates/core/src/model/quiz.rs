use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::ItemId;

/// Number of options every item carries; choices index positionally A-D.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when converting answer designators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("invalid choice index: {0}")]
    InvalidIndex(usize),
    #[error("invalid answer letter: {0:?}")]
    InvalidLetter(String),
}

//
// ─── CHOICE ───────────────────────────────────────────────────────────────────
//

/// One of the four positional answer slots of an item.
///
/// Used both for the item's correct answer and for learner submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    /// Converts a positional index (0-3) to a `Choice`.
    ///
    /// # Errors
    ///
    /// Returns `ChoiceError::InvalidIndex` if the value is not in the range 0-3.
    pub fn from_index(index: usize) -> Result<Self, ChoiceError> {
        match index {
            0 => Ok(Self::A),
            1 => Ok(Self::B),
            2 => Ok(Self::C),
            3 => Ok(Self::D),
            _ => Err(ChoiceError::InvalidIndex(index)),
        }
    }

    /// Converts a letter designator to a `Choice`.
    ///
    /// Surrounding whitespace is ignored and the letter is case-insensitive,
    /// matching what generative models actually emit (`" b "`, `"C"`).
    ///
    /// # Errors
    ///
    /// Returns `ChoiceError::InvalidLetter` unless the trimmed input is a
    /// single letter A-D.
    pub fn from_letter(raw: &str) -> Result<Self, ChoiceError> {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return Err(ChoiceError::InvalidLetter(raw.to_owned()));
        };
        match letter.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            'C' => Ok(Self::C),
            'D' => Ok(Self::D),
            _ => Err(ChoiceError::InvalidLetter(raw.to_owned())),
        }
    }

    /// Positional index of this choice (0-3).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Choice::A => 0,
            Choice::B => 1,
            Choice::C => 2,
            Choice::D => 3,
        }
    }

    /// Letter designator of this choice.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Choice::A => 'A',
            Choice::B => 'B',
            Choice::C => 'C',
            Choice::D => 'D',
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

//
// ─── QUIZ ITEM ────────────────────────────────────────────────────────────────
//

/// One multiple-choice question: exactly four options, one correct index.
///
/// The canonical shape produced by the normalizer. `options` is kept as a
/// `Vec` rather than a fixed array so the standalone validator can report a
/// wrong option count on quizzes that arrive from other sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: ItemId,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuizItem {
    /// The correct answer as a `Choice`.
    ///
    /// # Errors
    ///
    /// Returns `ChoiceError::InvalidIndex` if `answer_index` is out of range;
    /// a validated item never fails.
    pub fn correct_choice(&self) -> Result<Choice, ChoiceError> {
        Choice::from_index(self.answer_index)
    }

    /// The option text for a given choice, if the option exists.
    #[must_use]
    pub fn option(&self, choice: Choice) -> Option<&str> {
        self.options.get(choice.index()).map(String::as_str)
    }

    /// Grades a submission: a single equality test against `answer_index`.
    #[must_use]
    pub fn is_correct(&self, choice: Choice) -> bool {
        choice.index() == self.answer_index
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// A topic-tagged, leveled, ordered collection of quiz items.
///
/// An empty `items` list is a representable degenerate state, not an error;
/// callers decide how to surface it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub topic: String,
    pub level: String,
    pub items: Vec<QuizItem>,
}

impl Quiz {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> QuizItem {
        QuizItem {
            id: ItemId::new("q1"),
            question: "2 + 2 = ?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            answer_index: 1,
            explanation: String::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn index_conversion_works() {
        assert_eq!(Choice::from_index(0).unwrap(), Choice::A);
        assert_eq!(Choice::from_index(3).unwrap(), Choice::D);
        let err = Choice::from_index(4).unwrap_err();
        assert!(matches!(err, ChoiceError::InvalidIndex(4)));
    }

    #[test]
    fn letter_conversion_ignores_case_and_whitespace() {
        assert_eq!(Choice::from_letter("b").unwrap(), Choice::B);
        assert_eq!(Choice::from_letter("  C ").unwrap(), Choice::C);
        assert!(Choice::from_letter("E").is_err());
        assert!(Choice::from_letter("").is_err());
        assert!(Choice::from_letter("AB").is_err());
    }

    #[test]
    fn grading_is_positional_equality() {
        let item = item();
        assert!(item.is_correct(Choice::B));
        assert!(!item.is_correct(Choice::A));
        assert_eq!(item.correct_choice().unwrap(), Choice::B);
        assert_eq!(item.option(Choice::B), Some("4"));
    }
}
