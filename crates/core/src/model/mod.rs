mod ids;
mod progress;
mod quiz;

pub use ids::ItemId;
pub use progress::{ProgressEntry, ProgressLedger, RecentOutcome};
pub use quiz::{Choice, ChoiceError, Quiz, QuizItem, OPTION_COUNT};
