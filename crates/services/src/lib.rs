#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod loader;
pub mod prediction;
pub mod recorder;

pub use practice_core::Clock;

pub use config::EngineConfig;
pub use engine::{CheckFeedback, PracticeEngine, PredictionDisplay, SubmitFeedback};
pub use error::{EngineError, PersistenceWarning, PredictionUnavailable};
pub use gate::AiGate;
pub use loader::QuestionBatchLoader;
pub use prediction::PredictionAdapter;
pub use recorder::AnswerRecorder;
