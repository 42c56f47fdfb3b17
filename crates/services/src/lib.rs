#![forbid(unsafe_code)]

pub mod chat;
pub mod error;
pub mod generation;
pub mod model_client;
pub mod prompt;
pub mod review;
pub mod sessions;

pub use quiz_core::Clock;

pub use chat::{ChatLog, ChatRole, ChatService, ChatTurn};
pub use error::{GenerateError, ModelError, SessionError};
pub use generation::{Difficulty, GenerateQuizRequest};
pub use model_client::{ChatModelClient, ContextRef, ModelConfig, TextModel};
pub use prompt::PromptLibrary;
pub use review::ReviewService;
pub use sessions::{QuizLoopService, QuizPhase, QuizSession, SessionProgress, SubmittedAnswer};
