use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ItemId;

//
// ─── PROGRESS ENTRY ───────────────────────────────────────────────────────────
//

/// Record of a single graded attempt.
///
/// At most one entry exists per item id across the lifetime of a ledger; the
/// first recorded outcome is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub item_id: ItemId,
    pub correct: bool,
    pub level: String,
    pub recorded_at: DateTime<Utc>,
}

/// One row of the recent-outcomes window shown next to the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentOutcome {
    pub correct: bool,
    pub level: String,
}

//
// ─── PROGRESS LEDGER ──────────────────────────────────────────────────────────
//

/// Append-only, per-item-deduplicated record of quiz attempt outcomes.
///
/// The aggregate counters are kept consistent with `history` by construction:
/// `total_attempts == history.len()` and `total_correct` counts the correct
/// entries. Insertion order is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLedger {
    total_attempts: u32,
    total_correct: u32,
    history: Vec<ProgressEntry>,
}

impl ProgressLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one graded attempt.
    ///
    /// Returns `false` without touching the ledger when the item id was
    /// already recorded: a retried submission after a re-render must not
    /// double-count.
    pub fn record(
        &mut self,
        item_id: ItemId,
        correct: bool,
        level: impl Into<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.history.iter().any(|entry| entry.item_id == item_id) {
            return false;
        }

        self.total_attempts = self.total_attempts.saturating_add(1);
        if correct {
            self.total_correct = self.total_correct.saturating_add(1);
        }
        self.history.push(ProgressEntry {
            item_id,
            correct,
            level: level.into(),
            recorded_at: now,
        });
        true
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn history(&self) -> &[ProgressEntry] {
        &self.history
    }

    /// Overall accuracy as a percentage; `0.0` when nothing was attempted.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        f64::from(self.total_correct) / f64::from(self.total_attempts) * 100.0
    }

    /// The last `n` outcomes in chronological order (fewer if history is shorter).
    #[must_use]
    pub fn recent_summary(&self, n: usize) -> Vec<RecentOutcome> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..]
            .iter()
            .map(|entry| RecentOutcome {
                correct: entry.correct,
                level: entry.level.clone(),
            })
            .collect()
    }

    /// Ids of incorrectly answered items, in recording order.
    #[must_use]
    pub fn missed_item_ids(&self) -> Vec<ItemId> {
        self.history
            .iter()
            .filter(|entry| !entry.correct)
            .map(|entry| entry.item_id.clone())
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn first_write_wins_for_an_item_id() {
        let mut ledger = ProgressLedger::new();
        assert!(ledger.record(ItemId::new("q1"), true, "easy", fixed_now()));
        assert!(!ledger.record(ItemId::new("q1"), false, "easy", fixed_now()));

        assert_eq!(ledger.total_attempts(), 1);
        assert_eq!(ledger.total_correct(), 1);
        assert_eq!(ledger.history().len(), 1);
        assert!(ledger.history()[0].correct);
    }

    #[test]
    fn accuracy_is_zero_without_attempts() {
        let ledger = ProgressLedger::new();
        assert_eq!(ledger.accuracy(), 0.0);
    }

    #[test]
    fn accuracy_is_a_percentage() {
        let mut ledger = ProgressLedger::new();
        for (id, correct) in [("q1", true), ("q2", true), ("q3", true), ("q4", false)] {
            ledger.record(ItemId::new(id), correct, "medium", fixed_now());
        }
        assert_eq!(ledger.accuracy(), 75.0);
    }

    #[test]
    fn recent_summary_keeps_chronological_order() {
        let mut ledger = ProgressLedger::new();
        for (id, correct) in [("q1", true), ("q2", false), ("q3", true)] {
            ledger.record(ItemId::new(id), correct, "hard", fixed_now());
        }

        let recent = ledger.recent_summary(2);
        assert_eq!(recent.len(), 2);
        assert!(!recent[0].correct);
        assert!(recent[1].correct);

        // Asking for more than exists returns everything.
        assert_eq!(ledger.recent_summary(10).len(), 3);
    }

    #[test]
    fn missed_ids_follow_recording_order() {
        let mut ledger = ProgressLedger::new();
        for (id, correct) in [("q1", false), ("q2", true), ("q3", false)] {
            ledger.record(ItemId::new(id), correct, "easy", fixed_now());
        }
        assert_eq!(
            ledger.missed_item_ids(),
            vec![ItemId::new("q1"), ItemId::new("q3")]
        );
    }
}
