#![forbid(unsafe_code)]

pub mod config;
pub mod contracts;
pub mod http;
pub mod memory;

pub use config::{BackendConfig, ConfigError};
pub use contracts::{
    AnswerPersistence, Backend, BackendError, FailureKind, PredictionService, QuestionProvider,
    SubjectAttemptCounter, SubmissionAck, TestSessionLifecycle, TestSessionSummary,
};
pub use http::HttpBackend;
pub use memory::InMemoryBackend;
