//! Business logic services.

#![allow(missing_docs)]

pub mod completion;
pub mod quiz;
pub mod transport;
pub mod usage_limit;
pub mod user;

pub use completion::{
    ChatCompletion, ChatMessage, CompletionClient, CompletionConfig, MessageRole,
};
pub use quiz::{
    ChatInput, ChatOutcome, ExplainInput, ExplainOutcome, Question, QuestionBank, QuizService,
    TranslateInput,
};
pub use transport::{CreateRequestInput, RequestView, TransportService, VolunteerInfo};
pub use usage_limit::{
    MemoryUsageStore, QuizFeature, RedisUsageStore, UsageDecision, UsageLimiter, UsageStore,
};
pub use user::{SignupInput, UserService};
